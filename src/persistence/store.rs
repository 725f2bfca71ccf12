//! Save storage backends
//!
//! `FileStore` writes atomically with backup rotation: the old save is
//! copied to the backup, then the temp file is renamed over the save. There
//! is always a complete save or backup on disk.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::SaveError;

/// Where save text lives. All calls are synchronous and fallible.
pub trait SaveStore {
    /// Current save, `None` when nothing has been saved yet
    fn load(&self) -> Result<Option<String>, SaveError>;

    /// Previous save, kept when a new one is written
    fn load_backup(&self) -> Result<Option<String>, SaveError>;

    fn save(&mut self, data: &str) -> Result<(), SaveError>;

    /// Delete the current save and its backup
    fn clear(&mut self) -> Result<(), SaveError>;
}

#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> PathBuf {
        self.path.with_extension("bak")
    }

    fn tmp_path(&self) -> PathBuf {
        self.path.with_extension("tmp")
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, SaveError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn remove_optional(path: &Path) -> Result<(), SaveError> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}

impl SaveStore for FileStore {
    fn load(&self) -> Result<Option<String>, SaveError> {
        read_optional(&self.path)
    }

    fn load_backup(&self) -> Result<Option<String>, SaveError> {
        read_optional(&self.backup_path())
    }

    fn save(&mut self, data: &str) -> Result<(), SaveError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let tmp = self.tmp_path();
        fs::write(&tmp, data)?;
        if self.path.exists() {
            fs::copy(&self.path, self.backup_path())?;
        }
        fs::rename(&tmp, &self.path)?;
        log::debug!("Saved {} bytes to {}", data.len(), self.path.display());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), SaveError> {
        remove_optional(&self.path)?;
        remove_optional(&self.backup_path())
    }
}

/// In-process store for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    current: Option<String>,
    backup: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SaveStore for MemoryStore {
    fn load(&self) -> Result<Option<String>, SaveError> {
        Ok(self.current.clone())
    }

    fn load_backup(&self) -> Result<Option<String>, SaveError> {
        Ok(self.backup.clone())
    }

    fn save(&mut self, data: &str) -> Result<(), SaveError> {
        self.backup = self.current.replace(data.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), SaveError> {
        self.current = None;
        self.backup = None;
        Ok(())
    }
}
