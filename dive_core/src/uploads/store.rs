//! Disk persistence for accepted uploads.

use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::PathBuf;
use tokio::fs as async_fs;
use uuid::Uuid;

use super::category;
use super::models::{StagedUpload, StoredUpload};
use crate::error::{AppError, Result};

lazy_static! {
    // Stored files are always named {uuid}.{ext} by this store. Anything
    // else in a lookup is a fabricated name and never touches the
    // filesystem.
    static ref STORED_NAME: Regex =
        Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}\.[a-z0-9]{1,8}$")
            .unwrap();
}

/// Owns the storage root; accepted files land under one subdirectory per
/// category.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn initialize(&self) -> Result<()> {
        async_fs::create_dir_all(&self.root).await?;
        for name in category::category_names() {
            async_fs::create_dir_all(self.root.join(name)).await?;
        }
        Ok(())
    }

    /// Persist an already-validated staged upload. The staged copy is left
    /// in place for the handler to clean up.
    pub async fn store(&self, category: &str, staged: &StagedUpload) -> Result<StoredUpload> {
        if category::rule_for(category).is_none() {
            return Err(AppError::BadRequest(format!("Invalid file category: {}", category)));
        }

        let id = Uuid::new_v4();
        let filename = match staged.extension() {
            Some(ext) => format!("{}.{}", id, ext),
            None => id.to_string(),
        };

        let directory = self.root.join(category);
        async_fs::create_dir_all(&directory).await?;
        let destination = directory.join(&filename);

        async_fs::copy(&staged.path, &destination).await?;

        tracing::info!(
            category = %category,
            filename = %filename,
            size = staged.size,
            "stored upload"
        );

        Ok(StoredUpload {
            id,
            category: category.to_string(),
            filename,
            original_filename: staged.original_filename.clone(),
            content_type: staged.content_type.clone(),
            size: staged.size,
            uploaded_at: Utc::now(),
        })
    }

    /// Read a stored file back. `None` when no such file exists.
    pub async fn read(&self, category: &str, filename: &str) -> Result<Option<Vec<u8>>> {
        let Some(path) = self.resolve(category, filename) else {
            return Ok(None);
        };

        match async_fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => {
                tracing::error!("Failed to read stored upload {}: {}", path.display(), err);
                Err(err.into())
            }
        }
    }

    /// Remove a stored file. `false` when no such file existed.
    pub async fn remove(&self, category: &str, filename: &str) -> Result<bool> {
        let Some(path) = self.resolve(category, filename) else {
            return Ok(false);
        };

        match async_fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(category = %category, filename = %filename, "removed upload");
                Ok(true)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => {
                tracing::error!("Failed to remove stored upload {}: {}", path.display(), err);
                Err(err.into())
            }
        }
    }

    fn resolve(&self, category: &str, filename: &str) -> Option<PathBuf> {
        if category::rule_for(category).is_none() || !STORED_NAME.is_match(filename) {
            return None;
        }
        Some(self.root.join(category).join(filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn staged_pdf() -> (StagedUpload, NamedTempFile) {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"%PDF-1.7\n%%EOF\n").unwrap();
        let staged = StagedUpload {
            original_filename: "invoice.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            size: 15,
            path: file.path().to_path_buf(),
        };
        (staged, file)
    }

    #[tokio::test]
    async fn store_and_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = UploadStore::new(dir.path());
        store.initialize().await.unwrap();

        let (staged, _file) = staged_pdf();
        let stored = store.store("invoice", &staged).await.unwrap();
        assert_eq!(stored.category, "invoice");
        assert_eq!(stored.original_filename, "invoice.pdf");
        assert!(stored.filename.ends_with(".pdf"));

        let data = store.read("invoice", &stored.filename).await.unwrap().unwrap();
        assert_eq!(data, b"%PDF-1.7\n%%EOF\n");
    }

    #[tokio::test]
    async fn remove_deletes_the_file() {
        let dir = TempDir::new().unwrap();
        let store = UploadStore::new(dir.path());
        store.initialize().await.unwrap();

        let (staged, _file) = staged_pdf();
        let stored = store.store("invoice", &staged).await.unwrap();

        assert!(store.remove("invoice", &stored.filename).await.unwrap());
        assert!(store.read("invoice", &stored.filename).await.unwrap().is_none());
        assert!(!store.remove("invoice", &stored.filename).await.unwrap());
    }

    #[tokio::test]
    async fn fabricated_names_never_resolve() {
        let dir = TempDir::new().unwrap();
        let store = UploadStore::new(dir.path());
        store.initialize().await.unwrap();

        assert!(store.read("invoice", "../../etc/passwd").await.unwrap().is_none());
        assert!(store.read("invoice", "notauuid.pdf").await.unwrap().is_none());
        assert!(store.read("no-such-category", "photo.png").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_category_cannot_store() {
        let dir = TempDir::new().unwrap();
        let store = UploadStore::new(dir.path());
        store.initialize().await.unwrap();

        let (staged, _file) = staged_pdf();
        let result = store.store("boat-photo", &staged).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
