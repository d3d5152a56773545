//! Database catalog: the entry collection of one database folder
//!
//! All public operations take the catalog lock, so structural changes
//! (add, delete, rename) and entry edits never interleave. Entry edits go
//! through [`Database::edit`]: the closure mutates the entry and returns the
//! [`Change`] it made, and the catalog writes that change to disk before the
//! call returns.

use crate::domain::{validate_name, Change, ChangeSink, Entry};
use crate::error::{Result, SimpleDbError};
use crate::infrastructure::{Config, FileManager, LineEnding};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::warn;

/// Outcome of reconciling an entry's attachments with its folder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentSync {
    /// Stored names of files copied from their remote path
    pub copied: Vec<String>,
    /// Remote paths that could not be copied and stay remote
    pub pending: Vec<String>,
    /// Files removed from the entry folder
    pub deleted: Vec<String>,
}

/// What the catalog did in response to a [`Change`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    DataWritten,
    FilesSynced(AttachmentSync),
}

#[derive(Debug)]
pub struct Database {
    name: String,
    location: PathBuf,
    files: FileManager,
    entries: Mutex<Vec<Entry>>,
}

impl Database {
    /// Create a new, empty database folder `location/name`.
    pub fn create(location: impl AsRef<Path>, name: &str) -> Result<Self> {
        let location = location.as_ref();
        let name = validate_name(name)?;
        let files = FileManager::create(location, &name)?;

        Ok(Database {
            name,
            location: location.to_path_buf(),
            files,
            entries: Mutex::new(Vec::new()),
        })
    }

    /// Open the existing database folder `location/name` and load its entries.
    pub fn connect(location: impl AsRef<Path>, name: &str) -> Result<Self> {
        let location = location.as_ref();
        let name = validate_name(name)?;
        let files = FileManager::open(location, &name)?;
        let entries = files.load_all_entries()?;

        Ok(Database {
            name,
            location: location.to_path_buf(),
            files,
            entries: Mutex::new(entries),
        })
    }

    /// [`create`](Self::create) in the current working directory.
    pub fn create_here(name: &str) -> Result<Self> {
        Self::create(std::env::current_dir()?, name)
    }

    /// [`connect`](Self::connect) in the current working directory.
    pub fn connect_here(name: &str) -> Result<Self> {
        Self::connect(std::env::current_dir()?, name)
    }

    /// Names of the databases found directly under `path`.
    pub fn scan(path: impl AsRef<Path>) -> Result<Vec<String>> {
        FileManager::scan(path.as_ref())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn root(&self) -> &Path {
        self.files.root()
    }

    pub fn config(&self) -> &Config {
        self.files.config()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn entry_names(&self) -> Vec<String> {
        self.lock().iter().map(|e| e.name().to_string()).collect()
    }

    pub fn size(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        let name = name.trim();
        self.lock().iter().any(|e| e.name() == name)
    }

    /// Snapshot of the named entry. Changes to the copy are not persisted;
    /// use [`edit`](Self::edit) or the upload/remove methods instead.
    pub fn get(&self, name: &str) -> Option<Entry> {
        let name = name.trim();
        self.lock().iter().find(|e| e.name() == name).cloned()
    }

    /// Snapshot of all entries in insertion/load order.
    pub fn entries(&self) -> Vec<Entry> {
        self.lock().clone()
    }

    pub fn iter(&self) -> std::vec::IntoIter<Entry> {
        self.entries().into_iter()
    }

    /// Register `entry` and write it out: folder, data file, then every
    /// remote file it carries.
    ///
    /// If the folder or data file cannot be written the entry is not
    /// registered and its folder is removed when possible. Attachments that
    /// fail to copy stay in the entry's remote list.
    pub fn add(&self, mut entry: Entry) -> Result<()> {
        let mut entries = self.lock();

        if entries.iter().any(|e| e.name() == entry.name()) {
            return Err(SimpleDbError::AlreadyExists(format!(
                "Entry \"{}\" already exists",
                entry.name()
            )));
        }

        self.files.make_entry(entry.name())?;

        if let Err(e) = self.files.write_data(entry.name(), entry.data()) {
            if let Err(cleanup) = self.files.delete_entry(entry.name()) {
                warn!(entry = entry.name(), error = %cleanup, "could not undo partial add");
            }
            return Err(e);
        }

        let mut sync = AttachmentSync::default();
        self.copy_remote_files(&mut entry, &mut sync);

        entries.push(entry);
        Ok(())
    }

    /// Create an empty entry called `name` and add it.
    pub fn add_named(&self, name: &str) -> Result<()> {
        self.add(Entry::new(name)?)
    }

    /// Add several entries. Entries that fail are skipped and returned with
    /// their error.
    pub fn add_all<I>(&self, entries: I) -> Vec<(String, SimpleDbError)>
    where
        I: IntoIterator<Item = Entry>,
    {
        let mut failed = Vec::new();
        for entry in entries {
            let name = entry.name().to_string();
            if let Err(e) = self.add(entry) {
                failed.push((name, e));
            }
        }
        failed
    }

    /// Drop the entry from the catalog and delete its folder.
    ///
    /// The entry leaves the catalog even if the folder cannot be removed;
    /// the disk error is still returned.
    pub fn delete(&self, name: &str) -> Result<()> {
        let name = name.trim();
        let mut entries = self.lock();

        let pos = entries
            .iter()
            .position(|e| e.name() == name)
            .ok_or_else(|| SimpleDbError::NotFound(format!("Entry \"{}\" not found", name)))?;

        entries.remove(pos);
        self.files.delete_entry(name)
    }

    /// Rename an entry in memory and on disk as one step.
    pub fn rename(&self, name: &str, new_name: &str) -> Result<()> {
        let name = name.trim();
        let new_name = validate_name(new_name)?;
        let mut entries = self.lock();

        if entries.iter().any(|e| e.name() == new_name) {
            return Err(SimpleDbError::AlreadyExists(format!(
                "Entry \"{}\" already exists",
                new_name
            )));
        }

        let entry = entries
            .iter_mut()
            .find(|e| e.name() == name)
            .ok_or_else(|| SimpleDbError::NotFound(format!("Entry \"{}\" not found", name)))?;

        self.files.rename_entry(name, &new_name)?;
        entry.rename(&new_name)
    }

    /// Mutate the named entry and persist whatever it reports as changed.
    ///
    /// If `f` fails nothing is written.
    pub fn edit<F>(&self, name: &str, f: F) -> Result<Applied>
    where
        F: FnOnce(&mut Entry) -> Result<Change>,
    {
        let name = name.trim();
        let mut entries = self.lock();

        let entry = entries
            .iter_mut()
            .find(|e| e.name() == name)
            .ok_or_else(|| SimpleDbError::NotFound(format!("Entry \"{}\" not found", name)))?;

        let change = f(&mut *entry)?;
        self.apply(entry, change)
    }

    pub fn upload_line(&self, name: &str, line: &str) -> Result<()> {
        self.edit(name, |e| e.upload_line(line)).map(|_| ())
    }

    pub fn upload_data<I, S>(&self, name: &str, lines: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.edit(name, |e| e.upload_data(lines)).map(|_| ())
    }

    pub fn upload_files<I, S>(&self, name: &str, paths: I) -> Result<AttachmentSync>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.edit(name, |e| Ok(e.upload_files(paths))).map(synced)
    }

    pub fn remove_data(&self, name: &str, index: usize) -> Result<()> {
        self.edit(name, |e| e.remove_data(index)).map(|_| ())
    }

    pub fn remove_file(&self, name: &str, index: usize) -> Result<AttachmentSync> {
        self.edit(name, |e| e.remove_file(index)).map(synced)
    }

    pub fn clear_data(&self, name: &str) -> Result<()> {
        self.edit(name, |e| Ok(e.clear_data())).map(|_| ())
    }

    pub fn clear_files(&self, name: &str) -> Result<AttachmentSync> {
        self.edit(name, |e| Ok(e.clear_files())).map(synced)
    }

    /// The audit log of this database.
    pub fn read_log(&self) -> Result<Vec<String>> {
        self.files.read_log()
    }

    fn copy_remote_files(&self, entry: &mut Entry, sync: &mut AttachmentSync) {
        for source in entry.remote_files().to_vec() {
            match self.files.copy_attachment(entry, &source) {
                Ok(stored) => sync.copied.push(stored),
                Err(e) => {
                    warn!(entry = entry.name(), file = %source, error = %e, "attachment stays remote");
                    sync.pending.push(source);
                }
            }
        }
    }

    fn sync_files(&self, entry: &mut Entry) -> Result<AttachmentSync> {
        let mut sync = AttachmentSync::default();
        self.copy_remote_files(entry, &mut sync);

        for file in self.files.read_attachments(entry.name())? {
            if entry.local_files().contains(&file) {
                continue;
            }
            match self.files.delete_attachment(entry.name(), &file) {
                Ok(()) => sync.deleted.push(file),
                Err(e) => warn!(entry = entry.name(), file = %file, error = %e, "stale attachment kept"),
            }
        }

        Ok(sync)
    }
}

fn synced(applied: Applied) -> AttachmentSync {
    match applied {
        Applied::FilesSynced(sync) => sync,
        Applied::DataWritten => AttachmentSync::default(),
    }
}

impl ChangeSink<Entry> for Database {
    type Output = Result<Applied>;

    fn apply(&self, entry: &mut Entry, change: Change) -> Result<Applied> {
        match change {
            Change::Data => {
                self.files.write_data(entry.name(), entry.data())?;
                Ok(Applied::DataWritten)
            }
            Change::Files => self.sync_files(entry).map(Applied::FilesSynced),
        }
    }
}

impl fmt::Display for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in self.lock().iter() {
            write!(f, "{}{}", LineEnding::Platform.as_str(), entry)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Database {
    type Item = Entry;
    type IntoIter = std::vec::IntoIter<Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
