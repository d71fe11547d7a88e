use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub uploads: UploadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Root directory for accepted uploads, one subdirectory per category.
    pub storage_dir: PathBuf,
    /// Directory where multipart bodies are staged before validation.
    pub staging_dir: PathBuf,
    pub max_request_size_mb: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            request_timeout_seconds: 30,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("./uploads"),
            staging_dir: PathBuf::from("./staging"),
            // Largest category allows 15MB; leave room for multipart framing.
            max_request_size_mb: 20,
        }
    }
}

impl UploadConfig {
    pub fn max_request_size_bytes(&self) -> usize {
        (self.max_request_size_mb as usize) * 1024 * 1024
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?);

        if std::path::Path::new("config.toml").exists() {
            builder = builder.add_source(File::with_name("config"));
        }

        builder = builder.add_source(
            Environment::with_prefix("APP")
                .separator("_")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        app_config.validate()?;

        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port cannot be 0".to_string()));
        }

        if self.uploads.storage_dir.as_os_str().is_empty() {
            return Err(ConfigError::Message(
                "Upload storage directory cannot be empty".to_string(),
            ));
        }

        if self.uploads.staging_dir.as_os_str().is_empty() {
            return Err(ConfigError::Message(
                "Upload staging directory cannot be empty".to_string(),
            ));
        }

        if self.uploads.max_request_size_mb == 0 {
            return Err(ConfigError::Message(
                "Max request size must be greater than 0".to_string(),
            ));
        }

        if self.uploads.max_request_size_mb < 15 {
            tracing::warn!(
                "Max request size {}MB is below the largest category limit (15MB); \
                 large dive-site maps will be cut off before validation",
                self.uploads.max_request_size_mb
            );
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn create_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.uploads.storage_dir)?;
        std::fs::create_dir_all(&self.uploads.staging_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
    }

    #[test]
    fn zero_port_is_rejected() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_storage_dir_is_rejected() {
        let mut config = AppConfig::default();
        config.uploads.storage_dir = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn request_size_covers_largest_category() {
        let config = AppConfig::default();
        assert!(config.uploads.max_request_size_bytes() >= 15 * 1024 * 1024);
    }
}
