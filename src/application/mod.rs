//! Application layer - Catalog and use cases

pub mod database;
pub mod manage_config;

pub use database::{Applied, AttachmentSync, Database};
pub use manage_config::ConfigService;
