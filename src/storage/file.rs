//! File-backed storage backend.
//!
//! Keeps every item in one JSON object on disk, rewritten on each change.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::{item_size, KeyValueStorage};
use crate::error::StorageError;

// == File Storage ==
/// Durable storage persisted as a single JSON document.
///
/// Every operation re-reads the document first, so several handles on one
/// path (in one process or several) see each other's writes. Concurrent
/// writers to the same key resolve last-writer-wins.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    /// Last document read from or written to disk
    items: Mutex<HashMap<String, String>>,
    quota: usize,
}

impl FileStorage {
    /// Opens (or creates) the store at `path` with a capacity of `quota` bytes.
    ///
    /// A document that cannot be parsed is discarded and the store starts
    /// empty.
    pub fn open(path: impl AsRef<Path>, quota: usize) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let items = read_document(&path)?.unwrap_or_default();
        debug!(path = %path.display(), items = items.len(), "file storage: opened");

        Ok(Self {
            path,
            items: Mutex::new(items),
            quota,
        })
    }

    /// Replaces `items` with the current document on disk.
    ///
    /// A corrupt document keeps the last good snapshot.
    fn refresh(&self, items: &mut HashMap<String, String>) -> Result<(), StorageError> {
        if let Some(current) = read_document(&self.path)? {
            *items = current;
        }
        Ok(())
    }

    /// Writes the document via a temporary file so a crash never leaves it half written.
    fn flush(&self, items: &HashMap<String, String>) -> Result<(), StorageError> {
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec(items)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Reads the document at `path`.
///
/// Returns an empty map when the file does not exist and None when it
/// cannot be parsed.
fn read_document(path: &Path) -> Result<Option<HashMap<String, String>>, StorageError> {
    match fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(items) => Ok(Some(items)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "file storage: corrupt document");
                Ok(None)
            }
        },
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Some(HashMap::new())),
        Err(e) => Err(e.into()),
    }
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut items = self.items.lock();
        self.refresh(&mut items)?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock();
        self.refresh(&mut items)?;

        let used: usize = items
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| item_size(k, v))
            .sum();
        let needed = used + item_size(key, value);
        if needed > self.quota {
            return Err(StorageError::QuotaExceeded {
                needed,
                capacity: self.quota,
            });
        }

        let previous = items.insert(key.to_string(), value.to_string());
        if let Err(e) = self.flush(&items) {
            // Keep memory consistent with what is on disk
            match previous {
                Some(old) => items.insert(key.to_string(), old),
                None => items.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock();
        self.refresh(&mut items)?;

        if let Some(old) = items.remove(key) {
            if let Err(e) = self.flush(&items) {
                items.insert(key.to_string(), old);
                return Err(e);
            }
        }
        Ok(())
    }
}
