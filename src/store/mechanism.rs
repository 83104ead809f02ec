//! Storage Mechanism Module
//!
//! The flat key/value substrate the bounded store sits on. A mechanism only
//! knows how to get, set and remove string values and how to list its keys.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;

// == Mechanism Trait ==
/// A key/value persistence substrate with key iteration.
pub trait Mechanism: Send + Sync + Debug {
    /// Returns the raw value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: String) -> Result<()>;

    /// Removes `key`. Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;

    /// Snapshot of every key currently held, in no particular order.
    fn keys(&self) -> Result<Vec<String>>;

    /// Snapshot of every `(key, value)` pair currently held.
    fn entries(&self) -> Result<Vec<(String, String)>> {
        let mut entries = Vec::new();
        for key in self.keys()? {
            if let Some(value) = self.get(&key)? {
                entries.push((key, value));
            }
        }
        Ok(entries)
    }
}

// == Memory Mechanism ==
/// In-process mechanism backed by a HashMap. Never fails.
#[derive(Debug, Default, Clone)]
pub struct MemoryMechanism {
    entries: HashMap<String, String>,
}

impl MemoryMechanism {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Mechanism for MemoryMechanism {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.keys().cloned().collect())
    }

    fn entries(&self) -> Result<Vec<(String, String)>> {
        Ok(self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

// == JSON File Mechanism ==
/// Persistent mechanism holding every entry in one JSON object on disk.
///
/// The whole map is rewritten on each mutation through a temporary file that
/// is renamed over the target, so a crash leaves either the old or the new
/// file, never a torn one.
#[derive(Debug)]
pub struct JsonFileMechanism {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileMechanism {
    /// Opens the store at `path`. A missing file is an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries: BTreeMap<String, String> = match fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        debug!(
            "Opened file mechanism at {} with {} entries",
            path.display(),
            entries.len()
        );

        Ok(Self { path, entries })
    }

    fn flush(&self) -> Result<()> {
        let bytes = serde_json::to_vec(&self.entries)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        if let Err(e) = fs::write(&tmp, bytes) {
            warn!("Failed to write {}: {}", tmp.display(), e);
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        if let Err(e) = fs::rename(&tmp, &self.path) {
            warn!(
                "Failed to rename {} to {}: {}",
                tmp.display(),
                self.path.display(),
                e
            );
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        Ok(())
    }

    /// Puts `key` back to `previous` after a failed flush.
    fn restore(&mut self, key: &str, previous: Option<String>) {
        match previous {
            Some(value) => self.entries.insert(key.to_string(), value),
            None => self.entries.remove(key),
        };
    }
}

impl Mechanism for JsonFileMechanism {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        let previous = self.entries.insert(key.to_string(), value);
        if let Err(e) = self.flush() {
            self.restore(key, previous);
            return Err(e);
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let Some(previous) = self.entries.remove(key) else {
            return Ok(());
        };
        if let Err(e) = self.flush() {
            self.restore(key, Some(previous));
            return Err(e);
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.keys().cloned().collect())
    }
}
