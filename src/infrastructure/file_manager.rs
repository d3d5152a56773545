//! File system driver for one database folder
//!
//! Layout under `<location>/<name>/`:
//!
//! ```text
//! .sddata/log.dat        append-only audit log
//! .sddata/config.toml    optional settings
//! <entry>/<entry>.dat    data lines
//! <entry>/<other>        attachments
//! ```
//!
//! Every public operation takes the driver lock for its whole duration, so
//! two operations on the same database never interleave.

use crate::domain::{validate_name, Entry, METADATA_DIR};
use crate::error::{Result, SimpleDbError};
use crate::infrastructure::config::{Config, LineEnding};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Name of the audit log inside the metadata folder.
pub const LOG_FILE: &str = "log.dat";

/// Extension of the per-entry data file.
pub const DATA_EXTENSION: &str = "dat";

#[derive(Debug)]
pub struct FileManager {
    root: PathBuf,
    config: Config,
    lock: Mutex<()>,
}

impl FileManager {
    /// Open an existing database folder at `location/name`.
    pub fn open(location: &Path, name: &str) -> Result<Self> {
        let name = validate_name(name)?;
        let root = location.join(&name);

        if !root.is_dir() {
            return Err(SimpleDbError::NotFound(format!(
                "Database {} not found in {}",
                name,
                location.display()
            )));
        }

        let manager = Self::with_root(root)?;
        manager.ensure_log_file();
        debug!(root = %manager.root.display(), "opened database");
        Ok(manager)
    }

    /// Create a new database folder at `location/name` with an empty audit log.
    pub fn create(location: &Path, name: &str) -> Result<Self> {
        let name = validate_name(name)?;
        let root = location.join(&name);

        if root.exists() {
            return Err(SimpleDbError::AlreadyExists(format!(
                "Database {} already exists in {}",
                name,
                location.display()
            )));
        }

        fs::create_dir_all(&root)
            .map_err(|e| SimpleDbError::io_failure(format!("create {}", root.display()), e))?;

        let manager = Self::with_root(root)?;
        manager.ensure_log_file();
        debug!(root = %manager.root.display(), "created database");
        Ok(manager)
    }

    fn with_root(root: PathBuf) -> Result<Self> {
        let config = Config::load_from_dir(&root)?;
        Ok(FileManager {
            root,
            config,
            lock: Mutex::new(()),
        })
    }

    /// List the immediate subfolders of `path` that look like databases.
    pub fn scan(path: &Path) -> Result<Vec<String>> {
        if !path.is_dir() {
            return Err(SimpleDbError::NotFound(format!(
                "{} not found or not a directory",
                path.display()
            )));
        }

        let names = child_dirs(path)
            .filter(|(_, dir)| dir.join(METADATA_DIR).is_dir())
            .map(|(name, _)| name)
            .collect();
        Ok(names)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn log_path(&self) -> PathBuf {
        self.root.join(METADATA_DIR).join(LOG_FILE)
    }

    fn entry_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn data_path(&self, name: &str) -> PathBuf {
        self.entry_dir(name)
            .join(format!("{}.{}", name, DATA_EXTENSION))
    }

    fn ensure_log_file(&self) {
        let log_path = self.log_path();
        if log_path.is_file() {
            return;
        }

        let created = fs::create_dir_all(self.root.join(METADATA_DIR)).and_then(|_| {
            OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(false)
                .open(&log_path)
                .map(|_| ())
        });
        if let Err(e) = created {
            warn!(path = %log_path.display(), error = %e, "could not create audit log");
        }
    }

    /// Append one line to the audit log. Failures are reported and dropped.
    pub fn log(&self, line: &str) {
        let _guard = self.guard();
        self.append_log(line);
    }

    fn append_log(&self, line: &str) {
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_path())
            .and_then(|mut file| write!(file, "{}{}", line, LineEnding::Platform.as_str()));

        if let Err(e) = result {
            warn!(line, error = %e, "audit log write failed");
        }
    }

    /// Read the audit log, one event per element.
    pub fn read_log(&self) -> Result<Vec<String>> {
        let _guard = self.guard();
        let path = self.log_path();
        if !path.is_file() {
            return Err(SimpleDbError::NotFound(format!(
                "Audit log {} not found",
                path.display()
            )));
        }
        let contents = fs::read_to_string(&path)
            .map_err(|e| SimpleDbError::io_failure(format!("read {}", path.display()), e))?;
        Ok(contents.lines().map(String::from).collect())
    }

    /// Names of all entry folders, sorted.
    pub fn list_entry_names(&self) -> Vec<String> {
        let _guard = self.guard();
        self.entry_names_unlocked()
    }

    fn entry_names_unlocked(&self) -> Vec<String> {
        child_dirs(&self.root)
            .map(|(name, _)| name)
            .filter(|name| name != METADATA_DIR)
            .collect()
    }

    /// Rebuild every entry stored under the root.
    pub fn load_all_entries(&self) -> Result<Vec<Entry>> {
        let _guard = self.guard();
        let mut entries = Vec::new();

        for name in self.entry_names_unlocked() {
            let data = match self.read_data_unlocked(&name) {
                Ok(data) => data,
                Err(SimpleDbError::NotFound(msg)) => {
                    warn!(entry = %name, "{}; loading with no data", msg);
                    Vec::new()
                }
                Err(e) => return Err(e),
            };
            let files = self.read_attachments_unlocked(&name)?;
            entries.push(Entry::from_disk(name, data, files));
        }

        Ok(entries)
    }

    /// Read the data lines of an entry.
    pub fn read_data(&self, name: &str) -> Result<Vec<String>> {
        let _guard = self.guard();
        self.read_data_unlocked(name)
    }

    fn read_data_unlocked(&self, name: &str) -> Result<Vec<String>> {
        let path = self.data_path(name);
        if !path.is_file() {
            return Err(SimpleDbError::NotFound(format!(
                "Data file of '{}' not found",
                name
            )));
        }

        let contents = fs::read_to_string(&path)
            .map_err(|e| SimpleDbError::io_failure(format!("read {}", path.display()), e))?;
        Ok(contents.lines().map(String::from).collect())
    }

    /// Overwrite the data file of an entry with `lines`.
    pub fn write_data(&self, name: &str, lines: &[String]) -> Result<()> {
        let _guard = self.guard();
        let path = self.data_path(name);
        if !path.is_file() {
            return Err(SimpleDbError::NotFound(format!(
                "Data file of '{}' not found",
                name
            )));
        }

        let terminator = self.config.line_ending.as_str();
        let content: String = lines
            .iter()
            .map(|line| format!("{}{}", line, terminator))
            .collect();

        let written = if self.config.staged_writes {
            write_staged(&path, &self.root.join(METADATA_DIR), &content)
        } else {
            fs::write(&path, content)
        };
        written.map_err(|e| SimpleDbError::io_failure(format!("write {}", path.display()), e))?;

        self.append_log(&format!("edit data in '{}'", name));
        debug!(entry = name, lines = lines.len(), "wrote data");
        Ok(())
    }

    /// Attachments on disk: every file in the entry folder except its data file.
    pub fn read_attachments(&self, name: &str) -> Result<Vec<String>> {
        let _guard = self.guard();
        self.read_attachments_unlocked(name)
    }

    fn read_attachments_unlocked(&self, name: &str) -> Result<Vec<String>> {
        let dir = self.entry_dir(name);
        if !dir.is_dir() {
            return Err(SimpleDbError::NotFound(format!(
                "Folder of '{}' not found",
                name
            )));
        }

        let data_file = format!("{}.{}", name, DATA_EXTENSION);
        let files = WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| e.file_name().to_str().map(String::from))
            .filter(|file| *file != data_file)
            .collect();
        Ok(files)
    }

    /// Copy `source` into the entry folder and move it from the entry's
    /// remote list to its local list. Returns the stored file name.
    pub fn copy_attachment(&self, entry: &mut Entry, source: &str) -> Result<String> {
        let _guard = self.guard();
        let src = Path::new(source);

        if !src.exists() {
            return Err(SimpleDbError::NotFound(format!(
                "File not found: {}",
                source
            )));
        }
        if !src.is_file() {
            return Err(SimpleDbError::NotFound(format!("{} is not a file", source)));
        }

        let basename = src
            .file_name()
            .and_then(|n| n.to_str())
            .map(String::from)
            .ok_or_else(|| {
                SimpleDbError::InvalidArgument(format!("{} has no usable file name", source))
            })?;

        let target = self.entry_dir(entry.name()).join(&basename);
        if target.exists() || entry.collides_with_local(source) {
            return Err(SimpleDbError::AlreadyExists(format!(
                "File {} is already in the entry '{}'",
                basename,
                entry.name()
            )));
        }

        fs::copy(src, &target).map_err(|e| {
            SimpleDbError::io_failure(format!("copy {} into '{}'", source, entry.name()), e)
        })?;

        entry.mark_copied(source, &basename);
        self.append_log(&format!("file added to '{}' [{}]", entry.name(), source));
        debug!(entry = entry.name(), file = %basename, "copied attachment");
        Ok(basename)
    }

    /// Remove an attachment from the entry folder.
    pub fn delete_attachment(&self, name: &str, filename: &str) -> Result<()> {
        let _guard = self.guard();
        let path = self.entry_dir(name).join(filename);

        fs::remove_file(&path).map_err(|e| {
            SimpleDbError::io_failure(format!("delete {} from '{}'", filename, name), e)
        })?;

        self.append_log(&format!("file delete from '{}' [{}]", name, filename));
        Ok(())
    }

    /// Create the entry folder and its empty data file.
    ///
    /// If the data file cannot be created the new folder is removed again.
    pub fn make_entry(&self, name: &str) -> Result<()> {
        let name = validate_name(name)?;
        let _guard = self.guard();
        self.make_entry_unlocked(&name)
    }

    fn make_entry_unlocked(&self, name: &str) -> Result<()> {
        let dir = self.entry_dir(name);

        fs::create_dir(&dir).map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                SimpleDbError::AlreadyExists(format!("Directory {} exists", name))
            } else {
                SimpleDbError::io_failure(format!("create folder of '{}'", name), e)
            }
        })?;

        let created = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.data_path(name));
        if let Err(e) = created {
            if let Err(cleanup) = fs::remove_dir(&dir) {
                warn!(entry = name, error = %cleanup, "could not remove half-made entry folder");
            }
            return Err(SimpleDbError::io_failure(
                format!("create data file of '{}'", name),
                e,
            ));
        }

        self.append_log(&format!("new entry '{}'", name));
        debug!(entry = name, "made entry");
        Ok(())
    }

    /// Remove an entry folder with everything in it.
    pub fn delete_entry(&self, name: &str) -> Result<()> {
        let _guard = self.guard();
        let dir = self.entry_dir(name);

        if !dir.is_dir() {
            return Err(SimpleDbError::NotFound(format!(
                "Directory {} not found",
                name
            )));
        }

        for item in WalkDir::new(&dir).min_depth(1).contents_first(true) {
            let Ok(item) = item else {
                continue;
            };
            let removed = if item.file_type().is_dir() {
                fs::remove_dir(item.path())
            } else {
                fs::remove_file(item.path())
            };
            if let Err(e) = removed {
                warn!(path = %item.path().display(), error = %e, "could not remove");
            }
        }

        fs::remove_dir(&dir).map_err(|e| {
            SimpleDbError::NotFound(format!("Directory {} could not be removed: {}", name, e))
        })?;

        self.append_log(&format!("del entry '{}'", name));
        debug!(entry = name, "deleted entry");
        Ok(())
    }

    /// Rename the entry folder and its data file.
    ///
    /// Refused if the entry already holds an attachment named like the new
    /// data file. If the data file cannot be renamed the folder rename is
    /// reverted when possible.
    pub fn rename_entry(&self, old: &str, new: &str) -> Result<()> {
        let new = validate_name(new)?;
        let _guard = self.guard();
        let old_dir = self.entry_dir(old);

        if self.entry_dir(&new).exists() {
            return Err(SimpleDbError::AlreadyExists(format!("Dir {} exists", new)));
        }
        if !old_dir.is_dir() || !self.data_path(old).is_file() {
            return Err(SimpleDbError::NotFound(format!(
                "Dir/File {} not found",
                old
            )));
        }
        let new_data_file = format!("{}.{}", new, DATA_EXTENSION);
        if old_dir.join(&new_data_file).exists() {
            return Err(SimpleDbError::AlreadyExists(format!(
                "File {} is already in the entry '{}'",
                new_data_file, old
            )));
        }

        self.move_entry_unlocked(old, &new)
    }

    fn move_entry_unlocked(&self, old: &str, new: &str) -> Result<()> {
        let old_dir = self.entry_dir(old);
        let new_dir = self.entry_dir(new);

        fs::rename(&old_dir, &new_dir).map_err(|e| {
            SimpleDbError::io_failure(format!("rename folder '{}' -> '{}'", old, new), e)
        })?;

        let moved_data = new_dir.join(format!("{}.{}", old, DATA_EXTENSION));
        if let Err(e) = fs::rename(&moved_data, self.data_path(new)) {
            if let Err(revert) = fs::rename(&new_dir, &old_dir) {
                warn!(old, new, error = %revert, "could not revert folder rename");
            }
            return Err(SimpleDbError::io_failure(
                format!("rename data file '{}' -> '{}'", old, new),
                e,
            ));
        }

        self.append_log(&format!("rename entry '{}' -> '{}'", old, new));
        debug!(old, new, "renamed entry");
        Ok(())
    }
}

/// Immediate subdirectories of `path` with UTF-8 names, sorted by name.
fn child_dirs(path: &Path) -> impl Iterator<Item = (String, PathBuf)> {
    WalkDir::new(path)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .filter_map(|e| {
            let name = e.file_name().to_str()?.to_string();
            Some((name, e.into_path()))
        })
}

/// Write to a temp file in `staging_dir`, then rename into place.
///
/// The staging folder sits on the same volume as every entry folder, and a
/// temp file left behind by a crash is never mistaken for an attachment.
/// On Windows, `rename` does not overwrite existing files, so the
/// destination is removed first.
fn write_staged(path: &Path, staging_dir: &Path, content: &str) -> std::io::Result<()> {
    let tmp_name = format!(
        "{}.tmp-{}",
        path.file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("data"),
        std::process::id()
    );
    let tmp_path = staging_dir.join(tmp_name);

    fs::create_dir_all(staging_dir)?;
    fs::write(&tmp_path, content)?;

    if cfg!(windows) && path.exists() {
        fs::remove_file(path)?;
    }

    fs::rename(&tmp_path, path)
}
