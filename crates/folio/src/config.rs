//! Configuration loading.
//!
//! A [`FolioConfig`] can be built from defaults, loaded from a TOML file, or
//! discovered by walking parent directories for a `folio.toml`.

use crate::error::{FolioError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    pub render: RenderConfig,
    pub http: HttpConfig,
}

/// Rendering defaults applied when a caller omits them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Default output resolution in dots per inch.
    pub default_dpi: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { default_dpi: 96.0 }
    }
}

/// HTTP fetch behavior for URL sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl FolioConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            FolioError::Config(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            FolioError::Config(format!("Invalid TOML in {}: {}", path.as_ref().display(), e))
        })
    }

    /// Discover a `folio.toml` in the current directory or any parent.
    ///
    /// Returns `Ok(None)` when no config file is found.
    pub fn discover() -> Result<Option<Self>> {
        let mut current = std::env::current_dir()
            .map_err(|e| FolioError::Config(format!("Cannot determine working directory: {}", e)))?;

        loop {
            let candidate = current.join("folio.toml");
            if candidate.exists() {
                return Ok(Some(Self::from_toml_file(candidate)?));
            }

            if let Some(parent) = current.parent() {
                current = parent.to_path_buf();
            } else {
                break;
            }
        }

        Ok(None)
    }
}
