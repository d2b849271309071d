//! Key-value blob storage the store writes through to.

use std::{
    collections::HashMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Storage key is not usable as a file name: {0:?}")]
    InvalidKey(String),
}

pub trait StateStorage: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn save(&self, key: &str, blob: &str) -> Result<(), StorageError>;
}

/// Process-local storage. Clones share the same entries.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, blob: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_owned(), blob.to_owned());
        Ok(())
    }
}

/// One `<key>.json` file per key inside `dir`.
///
/// Writes go to a sibling temp file that is then renamed over the target, so
/// a crash mid-write leaves the previous blob intact.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(StorageError::InvalidKey(key.to_owned()));
        }

        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl StateStorage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path(key)?) {
            Ok(blob) => Ok(Some(blob)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, key: &str, blob: &str) -> Result<(), StorageError> {
        let path = self.path(key)?;
        fs::create_dir_all(&self.dir)?;

        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, blob)?;
        fs::rename(&temp_path, &path)?;

        Ok(())
    }
}
