//! Generator configuration
//!
//! Loaded from an optional TOML file; command-line flags override its values.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Settings for the generated deck and package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub deck_id: i64,
    pub deck_name: String,
    pub deck_description: String,
    pub output: PathBuf,
    /// Directory inside the repository that holds definition files
    pub data_dir: String,
    /// Tag added to notes that disappeared between revisions
    pub removed_tag: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            deck_id: 123456,
            deck_name: "Generated".to_string(),
            deck_description: "Generated".to_string(),
            output: PathBuf::from("generated.apkg"),
            data_dir: "data".to_string(),
            removed_tag: "removed".to_string(),
        }
    }
}

/// Load configuration from `path`, falling back to defaults if it does not exist
pub fn load_config(path: &Path) -> Result<GeneratorConfig> {
    if !path.exists() {
        log::debug!("No config at {:?}, using defaults", path);
        return Ok(GeneratorConfig::default());
    }

    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
