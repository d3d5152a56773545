//! Error types for simpledb

use thiserror::Error;

/// Main error type for simpledb
#[derive(Debug, Error)]
pub enum SimpleDbError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("IO failure: {0}")]
    IoFailure(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML deserialization error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl SimpleDbError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            SimpleDbError::InvalidArgument(_) => 2,
            SimpleDbError::NotFound(_) => 3,
            SimpleDbError::AlreadyExists(_) => 4,
            _ => 1,
        }
    }

    /// Wrap an underlying I/O error with a description of the step that failed
    pub(crate) fn io_failure(what: impl std::fmt::Display, err: std::io::Error) -> Self {
        SimpleDbError::IoFailure(format!("{}: {}", what, err))
    }

    /// Get a user-friendly error message with suggestions
    pub fn display_with_suggestions(&self) -> String {
        match self {
            SimpleDbError::InvalidArgument(msg) if !msg.starts_with("Data line") => {
                format!(
                    "{}\n\n\
                    Names must:\n\
                    • contain at least one non-whitespace character\n\
                    • not contain path separators or any of < > : \" | ? *\n\
                    • not be '.', '..' or '.sddata'\n\
                    • be at most 251 bytes long",
                    msg
                )
            }
            SimpleDbError::NotFound(msg) if msg.starts_with("Database") => {
                format!(
                    "{}\n\n\
                    Suggestions:\n\
                    • Run 'simpledb create <name>' to create a new database\n\
                    • Run 'simpledb scan' to list databases in this location\n\
                    • Pass --location or set SIMPLEDB_LOCATION to the parent folder",
                    msg
                )
            }
            SimpleDbError::Config(msg) if msg.contains("Unknown config key") => {
                format!(
                    "{}\n\n\
                    Example: simpledb config <db> line_ending lf",
                    msg
                )
            }
            _ => self.to_string(),
        }
    }
}

/// Result type using SimpleDbError
pub type Result<T> = std::result::Result<T, SimpleDbError>;
