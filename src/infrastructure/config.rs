//! Per-database settings and location discovery

use crate::domain::METADATA_DIR;
use crate::error::{Result, SimpleDbError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable holding the default parent folder of databases.
pub const LOCATION_ENV: &str = "SIMPLEDB_LOCATION";

const CONFIG_FILE: &str = "config.toml";

/// Terminator written after every line of a `.dat` file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    /// `\r\n` on Windows, `\n` elsewhere
    #[default]
    Platform,
    Lf,
    Crlf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Platform => {
                if cfg!(windows) {
                    "\r\n"
                } else {
                    "\n"
                }
            }
            LineEnding::Lf => "\n",
            LineEnding::Crlf => "\r\n",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LineEnding::Platform => "platform",
            LineEnding::Lf => "lf",
            LineEnding::Crlf => "crlf",
        }
    }
}

impl FromStr for LineEnding {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "platform" => Ok(LineEnding::Platform),
            "lf" => Ok(LineEnding::Lf),
            "crlf" => Ok(LineEnding::Crlf),
            _ => Err(format!(
                "Invalid line ending: '{}'. Valid values are: platform, lf, crlf",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub line_ending: LineEnding,
    /// Write `.dat` files to a temporary sibling and rename them into place
    pub staged_writes: bool,
}

impl Config {
    /// Load config from .sddata/config.toml under `root`.
    /// A missing file yields the defaults.
    pub fn load_from_dir(root: &Path) -> Result<Self> {
        let config_path = root.join(METADATA_DIR).join(CONFIG_FILE);

        let contents = match fs::read_to_string(&config_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
            Err(e) => return Err(SimpleDbError::Io(e)),
        };

        toml::from_str(&contents)
            .map_err(|e| SimpleDbError::Config(format!("Failed to parse config.toml: {}", e)))
    }

    /// Save config to .sddata/config.toml under `root`
    pub fn save_to_dir(&self, root: &Path) -> Result<()> {
        let meta_dir = root.join(METADATA_DIR);

        if !meta_dir.exists() {
            fs::create_dir(&meta_dir)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(meta_dir.join(CONFIG_FILE), contents)?;
        Ok(())
    }
}

/// Pick the folder that holds databases: explicit flag, then
/// `SIMPLEDB_LOCATION`, then the current directory.
pub fn resolve_location(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }

    if let Ok(path) = std::env::var(LOCATION_ENV) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    Ok(std::env::current_dir()?)
}
