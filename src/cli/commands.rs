//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "simpledb")]
#[command(about = "Directory-backed record store", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Folder that holds the databases (default: $SIMPLEDB_LOCATION or current directory)
    #[arg(short = 'C', long, global = true, value_name = "DIR")]
    pub location: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new database
    Create {
        /// Database name
        db: String,
    },

    /// List the databases in a folder
    Scan {
        /// Folder to scan (default: the database location)
        path: Option<PathBuf>,
    },

    /// List the entry names of a database
    List {
        db: String,
    },

    /// Print a whole database or a single entry
    Show {
        db: String,
        entry: Option<String>,
    },

    /// Add a new entry
    Add {
        db: String,
        entry: String,

        /// Data line (repeatable)
        #[arg(short, long = "data", value_name = "LINE")]
        data: Vec<String>,

        /// File to attach (repeatable)
        #[arg(short, long = "file", value_name = "PATH")]
        file: Vec<String>,
    },

    /// Delete an entry and its folder
    Delete {
        db: String,
        entry: String,
    },

    /// Rename an entry
    Rename {
        db: String,
        entry: String,
        new_name: String,
    },

    /// Change the data lines of an entry
    Data {
        db: String,
        entry: String,

        #[command(subcommand)]
        action: DataAction,
    },

    /// Change the attachments of an entry
    File {
        db: String,
        entry: String,

        #[command(subcommand)]
        action: FileAction,
    },

    /// Print the audit log
    Log {
        db: String,
    },

    /// View or modify database settings
    Config {
        db: String,

        /// Config key to get or set
        key: Option<String>,

        /// Value to set (if provided, sets the key)
        value: Option<String>,

        /// List all configuration
        #[arg(short, long)]
        list: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum DataAction {
    /// Append lines
    Add {
        #[arg(required = true)]
        lines: Vec<String>,
    },
    /// Remove the line at INDEX (0-based)
    Remove { index: usize },
    /// Remove all lines
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum FileAction {
    /// Attach files by path
    Add {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Remove the file at INDEX (0-based, local files first)
    Remove { index: usize },
    /// Remove all files
    Clear,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add_with_data_and_files() {
        let cli = Cli::parse_from([
            "simpledb", "add", "db1", "alpha", "-d", "one", "--data", "two", "-f", "/tmp/x",
        ]);
        match cli.command {
            Commands::Add {
                db,
                entry,
                data,
                file,
            } => {
                assert_eq!(db, "db1");
                assert_eq!(entry, "alpha");
                assert_eq!(data, vec!["one", "two"]);
                assert_eq!(file, vec!["/tmp/x"]);
            }
            other => panic!("Unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_global_location_after_subcommand() {
        let cli = Cli::parse_from(["simpledb", "list", "db1", "-C", "/data"]);
        assert_eq!(cli.location, Some(PathBuf::from("/data")));
    }

    #[test]
    fn test_parse_nested_file_remove() {
        let cli = Cli::parse_from(["simpledb", "file", "db1", "alpha", "remove", "2"]);
        assert!(matches!(
            cli.command,
            Commands::File {
                action: FileAction::Remove { index: 2 },
                ..
            }
        ));
    }

    #[test]
    fn test_data_add_requires_lines() {
        assert!(Cli::try_parse_from(["simpledb", "data", "db1", "alpha", "add"]).is_err());
    }
}
