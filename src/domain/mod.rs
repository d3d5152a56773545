//! Domain layer - Entry model and change descriptions

pub mod change;
pub mod entry;
pub mod name;

pub use change::{Change, ChangeSink};
pub use entry::Entry;
pub use name::{validate_name, METADATA_DIR};
