//! Configuration management for imgdrop.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default config directory name.
const CONFIG_DIR_NAME: &str = "imgdrop";

/// Message shown when an upload fails without a usable server explanation.
pub const DEFAULT_FALLBACK_MESSAGE: &str = "An error occurred during upload.";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `IMGDROP_`, sections split on `__`)
/// 2. TOML config file at `~/.config/imgdrop/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server endpoint configuration.
    pub server: ServerConfig,
    /// Upload behaviour.
    pub upload: UploadConfig,
    /// Recent results listing.
    pub recent: RecentConfig,
}

/// Server endpoint configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the image service.
    pub base_url: String,
    /// Path of the multipart upload endpoint.
    pub upload_path: String,
    /// Path of the image listing endpoint.
    pub images_path: String,
    /// Name of the multipart field carrying the file.
    pub file_field: String,
    /// Whole-request timeout in seconds. 0 disables it.
    pub request_timeout_secs: u64,
    /// Connect timeout in seconds. 0 disables it.
    pub connect_timeout_secs: u64,
}

/// Upload behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// JPEG quality requested from the server (1-100). Server default when unset.
    pub quality: Option<u8>,
    /// Delay before re-listing recent results after a successful upload.
    pub refresh_delay_ms: u64,
    /// Message shown when the server gives no explanation for a failure.
    pub fallback_message: String,
}

/// Recent results listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecentConfig {
    /// Maximum number of entries rendered, taken from the end of the list.
    pub limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            upload_path: "/upload/".to_string(),
            images_path: "/images".to_string(),
            file_field: "uploaded_file".to_string(),
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            quality: None,
            refresh_delay_ms: 2000,
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
        }
    }
}

impl Default for RecentConfig {
    fn default() -> Self {
        Self { limit: 5 }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("IMGDROP_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        self.base_url()?;

        for (name, path) in [
            ("upload_path", &self.server.upload_path),
            ("images_path", &self.server.images_path),
        ] {
            if !path.starts_with('/') {
                return Err(Error::config_validation(format!(
                    "{name} must start with '/', got '{path}'"
                )));
            }
        }

        if self.server.file_field.is_empty() {
            return Err(Error::config_validation("file_field cannot be empty"));
        }

        if let Some(quality) = self.upload.quality {
            if !(1..=100).contains(&quality) {
                return Err(Error::config_validation(format!(
                    "quality must be between 1 and 100, got {quality}"
                )));
            }
        }

        if self.upload.fallback_message.trim().is_empty() {
            return Err(Error::config_validation(
                "fallback_message cannot be empty",
            ));
        }

        if self.recent.limit == 0 {
            return Err(Error::config_validation(
                "recent limit must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Parse the configured base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not an absolute http(s) URL.
    pub fn base_url(&self) -> Result<Url> {
        let url = Url::parse(&self.server.base_url)
            .map_err(|source| Error::invalid_url(&self.server.base_url, source))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config_validation(format!(
                "base_url must use http or https, got '{}'",
                url.scheme()
            )));
        }
        Ok(url)
    }

    /// Get the request timeout, if enabled.
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        match self.server.request_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Get the connect timeout, if enabled.
    #[must_use]
    pub fn connect_timeout(&self) -> Option<Duration> {
        match self.server.connect_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Get the post-upload refresh delay as a Duration.
    #[must_use]
    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.upload.refresh_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.server.upload_path, "/upload/");
        assert_eq!(config.server.images_path, "/images");
        assert_eq!(config.server.file_field, "uploaded_file");
        assert_eq!(config.upload.refresh_delay_ms, 2000);
        assert_eq!(config.upload.fallback_message, DEFAULT_FALLBACK_MESSAGE);
        assert!(config.upload.quality.is_none());
        assert_eq!(config.recent.limit, 5);
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_bad_base_url() {
        let mut config = Config::default();
        config.server.base_url = "not a url".to_string();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidUrl { .. }));
    }

    #[test]
    fn test_validate_non_http_scheme() {
        let mut config = Config::default();
        config.server.base_url = "ftp://example.com".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("http or https"));
    }

    #[test]
    fn test_validate_relative_path() {
        let mut config = Config::default();
        config.server.images_path = "images".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("images_path"));
    }

    #[test]
    fn test_validate_quality_range() {
        let mut config = Config::default();
        config.upload.quality = Some(0);
        assert!(config.validate().is_err());

        config.upload.quality = Some(101);
        assert!(config.validate().is_err());

        config.upload.quality = Some(85);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_limit() {
        let mut config = Config::default();
        config.recent.limit = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("limit"));
    }

    #[test]
    fn test_validate_blank_fallback() {
        let mut config = Config::default();
        config.upload.fallback_message = "   ".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timeouts() {
        let mut config = Config::default();
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.connect_timeout(), Some(Duration::from_secs(10)));

        config.server.request_timeout_secs = 0;
        config.server.connect_timeout_secs = 0;
        assert!(config.request_timeout().is_none());
        assert!(config.connect_timeout().is_none());
    }

    #[test]
    fn test_refresh_delay() {
        let config = Config::default();
        assert_eq!(config.refresh_delay(), Duration::from_millis(2000));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("imgdrop"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), Config::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[server]\nbase_url = \"http://images.local:9000\"\n\n[upload]\nquality = 70\n\n[recent]\nlimit = 3\n",
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.server.base_url, "http://images.local:9000");
        assert_eq!(config.server.upload_path, "/upload/");
        assert_eq!(config.upload.quality, Some(70));
        assert_eq!(config.recent.limit, 3);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[recent]\nlimit = 0\n").unwrap();

        let err = Config::load_from(Some(path)).unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { .. }));
    }

    #[test]
    fn test_server_config_deserialize() {
        let json = r#"{"base_url": "https://img.example.com", "request_timeout_secs": 5}"#;
        let server: ServerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(server.base_url, "https://img.example.com");
        assert_eq!(server.request_timeout_secs, 5);
        assert_eq!(server.images_path, "/images");
    }

    #[test]
    fn test_config_serialize() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("refresh_delay_ms"));
        assert!(json.contains("base_url"));
    }
}
