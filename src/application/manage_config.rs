//! Config management use case

use crate::error::{Result, SimpleDbError};
use crate::infrastructure::{Config, LineEnding};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const VALID_KEYS: &str = "line_ending, staged_writes";

/// Service for reading and changing the settings of one database folder
pub struct ConfigService {
    root: PathBuf,
}

impl ConfigService {
    /// Create a config service for the database rooted at `root`
    pub fn new(root: &Path) -> Self {
        ConfigService {
            root: root.to_path_buf(),
        }
    }

    /// Get a single config value
    pub fn get(&self, key: &str) -> Result<String> {
        let config = Config::load_from_dir(&self.root)?;

        match key {
            "line_ending" => Ok(config.line_ending.name().to_string()),
            "staged_writes" => Ok(config.staged_writes.to_string()),
            _ => Err(unknown_key(key)),
        }
    }

    /// Set a config value. Takes effect the next time the database is opened.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut config = Config::load_from_dir(&self.root)?;

        match key {
            "line_ending" => {
                config.line_ending = LineEnding::from_str(value).map_err(SimpleDbError::Config)?;
            }
            "staged_writes" => {
                config.staged_writes = value.trim().parse::<bool>().map_err(|_| {
                    SimpleDbError::Config(format!(
                        "Invalid value for staged_writes: '{}'. Use true or false",
                        value
                    ))
                })?;
            }
            _ => return Err(unknown_key(key)),
        }

        config.save_to_dir(&self.root)
    }

    /// List all config values
    pub fn list(&self) -> Result<Config> {
        Config::load_from_dir(&self.root)
    }
}

fn unknown_key(key: &str) -> SimpleDbError {
    SimpleDbError::Config(format!(
        "Unknown config key: '{}'. Valid keys are: {}",
        key, VALID_KEYS
    ))
}
