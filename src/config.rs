//! Application configuration.
//!
//! One flat `chalkboard.toml` loaded at startup. All fields have defaults,
//! user files only override what they want, and unknown keys are rejected to
//! catch typos early.
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [database]
//! path = "chalkboard.db"    # SQLite database file
//!
//! [images]
//! min_width = 640           # Minimum accepted width (px) for PNG/JPG uploads;
//!                           # wider uploads are downscaled to exactly this width
//! jpeg_quality = 90         # Quality for JPEG re-encodes after downscaling
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Top-level configuration loaded from `chalkboard.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub images: ImagesConfig,
}

impl AppConfig {
    /// Load and validate a config file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.images.min_width == 0 {
            return Err(ConfigError::Validation(
                "images.min_width must be non-zero".into(),
            ));
        }
        if self.images.jpeg_quality == 0 || self.images.jpeg_quality > 100 {
            return Err(ConfigError::Validation(
                "images.jpeg_quality must be 1-100".into(),
            ));
        }
        Ok(())
    }
}

/// SQLite storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "chalkboard.db".to_string() }
    }
}

/// Upload validation and normalization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Minimum accepted pixel width for PNG/JPG uploads; also the target
    /// width wider uploads are downscaled to. GIF uploads are exempt.
    pub min_width: u32,
    /// Quality (1-100) for JPEG re-encodes after downscaling.
    pub jpeg_quality: u8,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self { min_width: 640, jpeg_quality: 90 }
    }
}

/// A documented stock config file, printed by `chalkboard gen-config`.
pub fn stock_config_toml() -> String {
    "\
# chalkboard configuration
# All options are optional - defaults shown below.

[database]
# SQLite database file holding images and label entities.
path = \"chalkboard.db\"

[images]
# Minimum accepted width (px) for PNG/JPG uploads. Narrower uploads are
# rejected; wider ones are downscaled to exactly this width. GIF uploads
# are accepted as-is.
min_width = 640
# Quality for JPEG re-encodes after downscaling (1-100).
jpeg_quality = 90
"
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        AppConfig::default().validate().unwrap();
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = AppConfig::load(Path::new("/nonexistent/chalkboard.toml")).unwrap();
        assert_eq!(config.images.min_width, 640);
        assert_eq!(config.database.path, "chalkboard.db");
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config: AppConfig = toml::from_str("[images]\nmin_width = 512\n").unwrap();
        assert_eq!(config.images.min_width, 512);
        assert_eq!(config.images.jpeg_quality, 90);
    }

    #[test]
    fn unknown_keys_rejected() {
        let result: Result<AppConfig, _> = toml::from_str("[images]\nmax_width = 100\n");
        assert!(result.is_err());
    }

    #[test]
    fn zero_min_width_fails_validation() {
        let config: AppConfig = toml::from_str("[images]\nmin_width = 0\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn quality_out_of_range_fails_validation() {
        let config: AppConfig = toml::from_str("[images]\njpeg_quality = 101\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn stock_config_parses_back() {
        let config: AppConfig = toml::from_str(&stock_config_toml()).unwrap();
        config.validate().unwrap();
    }

    #[test]
    fn load_reads_a_real_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("chalkboard.toml");
        std::fs::write(&path, "[database]\npath = \"content.db\"\n").unwrap();
        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.database.path, "content.db");
    }
}
