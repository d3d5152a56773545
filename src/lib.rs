//! simpledb - Directory-backed record store
//!
//! A database is a folder with one subfolder per named entry. Each entry
//! keeps its text lines in `<entry>/<entry>.dat` next to any attached files,
//! and every successful change is appended to `.sddata/log.dat`.

pub mod application;
pub mod cli;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use application::{AttachmentSync, Database};
pub use domain::{Change, Entry};
pub use error::SimpleDbError;
