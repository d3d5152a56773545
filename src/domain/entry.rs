//! Entry model: a named record of text lines and attached files

use crate::domain::change::Change;
use crate::domain::name::validate_name;
use crate::error::{Result, SimpleDbError};
use std::fmt;
use std::path::Path;

#[cfg(windows)]
const LINE_SEPARATOR: &str = "\r\n";
#[cfg(not(windows))]
const LINE_SEPARATOR: &str = "\n";

/// A named record.
///
/// `local_files` holds basenames already copied into the entry folder,
/// `remote_files` holds source paths that still have to be copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    name: String,
    data: Vec<String>,
    local_files: Vec<String>,
    remote_files: Vec<String>,
}

impl Entry {
    /// Create an empty entry. The name is trimmed and validated.
    pub fn new(name: &str) -> Result<Self> {
        Ok(Entry {
            name: validate_name(name)?,
            data: Vec::new(),
            local_files: Vec::new(),
            remote_files: Vec::new(),
        })
    }

    /// Rebuild an entry from what is stored on disk.
    pub(crate) fn from_disk(name: String, data: Vec<String>, local_files: Vec<String>) -> Self {
        Entry {
            name,
            data,
            local_files,
            remote_files: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &[String] {
        &self.data
    }

    pub fn local_files(&self) -> &[String] {
        &self.local_files
    }

    pub fn remote_files(&self) -> &[String] {
        &self.remote_files
    }

    /// Local files followed by remote files; this is the index space of
    /// [`remove_file`](Self::remove_file).
    pub fn files(&self) -> Vec<String> {
        self.local_files
            .iter()
            .chain(self.remote_files.iter())
            .cloned()
            .collect()
    }

    pub fn data_count(&self) -> usize {
        self.data.len()
    }

    pub fn files_count(&self) -> usize {
        self.local_files.len() + self.remote_files.len()
    }

    /// Append one data line. A line may not contain `\n` or `\r`.
    pub fn upload_line(&mut self, line: impl Into<String>) -> Result<Change> {
        self.push_lines(vec![line.into()])?;
        Ok(Change::Data)
    }

    /// Append several data lines, keeping their order. Nothing is appended
    /// if any of them contains a line break.
    pub fn upload_data<I, S>(&mut self, lines: I) -> Result<Change>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_lines(lines.into_iter().map(Into::into).collect())?;
        Ok(Change::Data)
    }

    /// Queue one file for copying. The path is not checked here.
    pub fn upload_file(&mut self, path: impl Into<String>) -> Change {
        self.remote_files.push(path.into());
        Change::Files
    }

    /// Queue several files for copying.
    pub fn upload_files<I, S>(&mut self, paths: I) -> Change
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.remote_files.extend(paths.into_iter().map(Into::into));
        Change::Files
    }

    /// Remove the data line at `index`.
    pub fn remove_data(&mut self, index: usize) -> Result<Change> {
        if index >= self.data.len() {
            return Err(SimpleDbError::NotFound(format!(
                "Data index {} out of range in '{}' ({} lines)",
                index,
                self.name,
                self.data.len()
            )));
        }
        self.data.remove(index);
        Ok(Change::Data)
    }

    /// Remove the file at `index` in `local_files ++ remote_files`.
    pub fn remove_file(&mut self, index: usize) -> Result<Change> {
        if index >= self.files_count() {
            return Err(SimpleDbError::NotFound(format!(
                "File index {} out of range in '{}' ({} files)",
                index,
                self.name,
                self.files_count()
            )));
        }

        let split = self.local_files.len();
        if index < split {
            self.local_files.remove(index);
        } else {
            self.remote_files.remove(index - split);
        }
        Ok(Change::Files)
    }

    /// Builder form of [`upload_data`](Self::upload_data) for an entry that
    /// is not in a database yet.
    pub fn with_data<I, S>(mut self, lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_lines(lines.into_iter().map(Into::into).collect())?;
        Ok(self)
    }

    /// Builder form of [`upload_files`](Self::upload_files).
    pub fn with_files<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.remote_files.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn clear_data(&mut self) -> Change {
        self.data.clear();
        Change::Data
    }

    pub fn clear_files(&mut self) -> Change {
        self.local_files.clear();
        self.remote_files.clear();
        Change::Files
    }

    fn push_lines(&mut self, lines: Vec<String>) -> Result<()> {
        // the data file stores one line per element
        if let Some(line) = lines.iter().find(|l| l.contains(&['\n', '\r'][..])) {
            return Err(SimpleDbError::InvalidArgument(format!(
                "Data line {:?} of '{}' contains a line break",
                line, self.name
            )));
        }
        self.data.extend(lines);
        Ok(())
    }

    /// Change the in-memory name only. Renaming the folder on disk is the
    /// owning database's job.
    pub(crate) fn rename(&mut self, new_name: &str) -> Result<()> {
        self.name = validate_name(new_name)?;
        Ok(())
    }

    /// Record that `source` was copied into the entry folder as `basename`.
    pub(crate) fn mark_copied(&mut self, source: &str, basename: &str) {
        self.local_files.push(basename.to_string());
        if let Some(pos) = self.remote_files.iter().position(|p| p == source) {
            self.remote_files.remove(pos);
        }
    }

    /// Whether a local file already uses the basename of `source`.
    pub fn collides_with_local(&self, source: &str) -> bool {
        Path::new(source)
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|base| self.local_files.iter().any(|f| f == base))
    }
}

fn write_tree(f: &mut fmt::Formatter<'_>, title: &str, items: &[String]) -> fmt::Result {
    write!(f, "{}[{}] {}", LINE_SEPARATOR, items.len(), title)?;
    for (i, item) in items.iter().enumerate() {
        let branch = if i + 1 == items.len() { "└ " } else { "│ " };
        write!(f, "{}{}{}", LINE_SEPARATOR, branch, item)?;
    }
    Ok(())
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name: {}", self.name)?;
        write_tree(f, "Data", &self.data)?;
        write_tree(f, "Files", &self.files())
    }
}
