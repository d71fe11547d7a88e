//! Magic-byte sniffing for uploaded content.
//!
//! The leading bytes of a file identify its real format regardless of the
//! filename or the declared content type. Sniffing is authoritative: a file
//! whose header disagrees with its claim is rejected, never warned about.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Longest prefix any signature needs. WEBP places its tag at offset 8..12.
pub const SNIFF_LEN: usize = 12;

const JPEG_MAGIC: [u8; 3] = [0xFF, 0xD8, 0xFF];
const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Read at most [`SNIFF_LEN`] bytes from the start of the file.
///
/// A short read is not an error here; a file too small to carry a signature
/// simply matches nothing.
pub fn read_header(path: &Path) -> io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut header = Vec::with_capacity(SNIFF_LEN);
    file.take(SNIFF_LEN as u64).read_to_end(&mut header)?;
    Ok(header)
}

/// Does the sniffed header carry the signature of the given extension?
pub fn matches_extension(header: &[u8], extension: &str) -> bool {
    match extension {
        "jpeg" | "jpg" => header.starts_with(&JPEG_MAGIC),
        "png" => header.starts_with(&PNG_MAGIC),
        "webp" => {
            header.len() >= SNIFF_LEN
                && header.starts_with(b"RIFF")
                && &header[8..12] == b"WEBP"
        }
        "pdf" => header.starts_with(b"%PDF"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn jpeg_header_matches_both_spellings() {
        let header = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01];
        assert!(matches_extension(&header, "jpg"));
        assert!(matches_extension(&header, "jpeg"));
        assert!(!matches_extension(&header, "png"));
    }

    #[test]
    fn png_header_requires_full_signature() {
        let header = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];
        assert!(matches_extension(&header, "png"));

        // Truncated signature is not a PNG.
        let short = [0x89, 0x50, 0x4E, 0x47];
        assert!(!matches_extension(&short, "png"));
    }

    #[test]
    fn webp_needs_riff_and_webp_tags() {
        let header = *b"RIFF\x24\x00\x00\x00WEBP";
        assert!(matches_extension(&header, "webp"));

        let wave = *b"RIFF\x24\x00\x00\x00WAVE";
        assert!(!matches_extension(&wave, "webp"));
    }

    #[test]
    fn pdf_header() {
        assert!(matches_extension(b"%PDF-1.7\n%\xe2\xe3", "pdf"));
        assert!(!matches_extension(b"<!DOCTYPE htm", "pdf"));
    }

    #[test]
    fn unknown_extension_never_matches() {
        assert!(!matches_extension(b"%PDF-1.7\n%\xe2\xe3", "exe"));
        assert!(!matches_extension(b"%PDF-1.7\n%\xe2\xe3", "gif"));
    }

    #[test]
    fn read_header_is_bounded() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0xAB; 4096]).unwrap();
        let header = read_header(file.path()).unwrap();
        assert_eq!(header.len(), SNIFF_LEN);
    }

    #[test]
    fn read_header_tolerates_short_files() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"abc").unwrap();
        let header = read_header(file.path()).unwrap();
        assert_eq!(header, b"abc");
        assert!(!matches_extension(&header, "pdf"));
    }
}
