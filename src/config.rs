use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "scour.json";

const DEFAULT_SPILL_THRESHOLD_MB: usize = 256;

/// Global configuration for scour.
/// All fields are optional to support partial configurations and merging;
/// environment variables override file values, CLI flags override both.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Directory of crawled corpus items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corpus_path: Option<PathBuf>,
    /// Directory holding the index artifacts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_storage: Option<PathBuf>,
    /// In-memory accumulator budget before spilling, in megabytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spill_threshold_mb: Option<usize>,
}

impl Config {
    /// Loads configuration from a file (explicit path, or `scour.json` in the
    /// working directory when present) and applies environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    fn apply_env(&mut self) {
        if let Ok(value) = env::var("CORPUS_PATH") {
            if !value.is_empty() {
                self.corpus_path = Some(PathBuf::from(value));
            }
        }
        if let Ok(value) = env::var("INDEX_STORAGE") {
            if !value.is_empty() {
                self.index_storage = Some(PathBuf::from(value));
            }
        }
    }

    /// Spill threshold in bytes, defaulting to 256 MB.
    pub fn spill_threshold_bytes(&self) -> usize {
        self.spill_threshold_mb.unwrap_or(DEFAULT_SPILL_THRESHOLD_MB) * 1024 * 1024
    }
}
