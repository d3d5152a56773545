//! Output formatting utilities

use crate::application::AttachmentSync;

/// Format entry or database names, one per line
pub fn format_name_list(names: &[String], empty: &str) -> String {
    if names.is_empty() {
        return empty.to_string();
    }

    let mut output = String::new();
    for name in names {
        output.push_str(name);
        output.push('\n');
    }
    output
}

/// Describe what happened to attachments after a file change
pub fn format_sync(sync: &AttachmentSync) -> String {
    let mut output = String::new();
    for file in &sync.copied {
        output.push_str(&format!("copied  {}\n", file));
    }
    for file in &sync.deleted {
        output.push_str(&format!("deleted {}\n", file));
    }
    for path in &sync.pending {
        output.push_str(&format!("pending {}\n", path));
    }
    output
}
