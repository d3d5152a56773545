//! Infrastructure layer - Filesystem I/O and persistence

pub mod config;
pub mod file_manager;

pub use config::{resolve_location, Config, LineEnding, LOCATION_ENV};
pub use file_manager::FileManager;
