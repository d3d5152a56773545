//! CLI layer - Command-line interface

pub mod commands;
pub mod output;

pub use commands::{Cli, Commands, DataAction, FileAction};
pub use output::{format_name_list, format_sync};
