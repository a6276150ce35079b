//! Resize configuration module.
//!
//! Handles loading and validating `imgcache.toml` files. The configuration is
//! a plain value object injected into [`Resizer`](crate::resize::Resizer) at
//! construction — the pure modules (geometry, cache keys) never consult it,
//! so their outputs depend only on their inputs.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! valid_extensions = ["gif", "jpg", "jpeg", "png", "svg"]
//!
//! max_width = 3000          # Largest raster dimension processed (source or target)
//! max_height = 3000
//! jpeg_quality = 80         # JPEG encode quality (1-100)
//! debug = false             # Always regenerate, bypassing the cache probe
//!
//! use_ftp = false           # chmod fresh cache artifacts (safe-mode setups)
//! default_chmod = 0o644     # Mode applied when use_ftp is set
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse — override just the values you want. Unknown keys
//! are rejected to catch typos early.

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

/// Resize policy loaded from `imgcache.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    /// Extensions allowed through the pipeline; anything else is refused
    /// outright (not even returned unresized).
    pub valid_extensions: Vec<String>,
    /// Largest raster width processed — applies to both the source image and
    /// the requested target. Bounds worst-case decode cost per request.
    pub max_width: u32,
    /// Largest raster height processed.
    pub max_height: u32,
    /// JPEG encode quality (1-100).
    pub jpeg_quality: u8,
    /// Skip the cache probe and always regenerate.
    pub debug: bool,
    /// Apply `default_chmod` to freshly produced cache artifacts. Kept for
    /// hosting setups where the web server and the writer run as different
    /// users.
    pub use_ftp: bool,
    /// File mode applied when `use_ftp` is set.
    pub default_chmod: u32,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            valid_extensions: ["gif", "jpg", "jpeg", "png", "svg"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_width: 3000,
            max_height: 3000,
            jpeg_quality: 80,
            debug: false,
            use_ftp: false,
            default_chmod: 0o644,
        }
    }
}

impl ResizeConfig {
    /// Load a config file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(ConfigError::Validation("jpeg_quality must be 1-100".into()));
        }
        if self.max_width == 0 || self.max_height == 0 {
            return Err(ConfigError::Validation(
                "max_width and max_height must be non-zero".into(),
            ));
        }
        if self.valid_extensions.is_empty() {
            return Err(ConfigError::Validation(
                "valid_extensions must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Case-insensitive membership test against `valid_extensions`.
    pub fn allows_extension(&self, ext: &str) -> bool {
        self.valid_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(ext))
    }
}
