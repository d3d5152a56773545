//! Validation of names that are used verbatim as folder names

use crate::error::{Result, SimpleDbError};
use regex::Regex;
use std::sync::OnceLock;

/// Hidden folder inside a database root that holds the audit log and settings.
pub const METADATA_DIR: &str = ".sddata";

/// Longest name in bytes for which `<name>.dat` still fits a 255-byte file name.
pub const MAX_NAME_BYTES: usize = 251;

fn forbidden_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r#"[/\\<>:"|?*\x00-\x1F\x7F]"#).unwrap())
}

/// Trim `raw` and check it can be used as a single path segment.
///
/// Returns the trimmed name.
pub fn validate_name(raw: &str) -> Result<String> {
    let name = raw.trim();

    if name.is_empty() {
        return Err(SimpleDbError::InvalidArgument("Empty name".to_string()));
    }

    if name == "." || name == ".." {
        return Err(SimpleDbError::InvalidArgument(format!(
            "'{}' is not a valid name",
            name
        )));
    }

    if name == METADATA_DIR {
        return Err(SimpleDbError::InvalidArgument(format!(
            "'{}' is reserved for database metadata",
            name
        )));
    }

    if name.len() > MAX_NAME_BYTES {
        return Err(SimpleDbError::InvalidArgument(format!(
            "Name is {} bytes long, the limit is {}",
            name.len(),
            MAX_NAME_BYTES
        )));
    }

    if let Some(found) = forbidden_regex().find(name) {
        return Err(SimpleDbError::InvalidArgument(format!(
            "Name '{}' contains invalid character {:?}",
            name.escape_debug(),
            found.as_str()
        )));
    }

    Ok(name.to_string())
}
