//! Key Index Module
//!
//! The ordered list of live keys, oldest first, persisted as a JSON array of
//! strings under a reserved key in the same mechanism as the data.

use std::collections::HashSet;

use crate::error::{Result, StoreError};

/// Reserved mechanism key holding the serialized index.
pub const INDEX_KEY: &str = "__bounded_store_index__";

// == Key Index ==
/// Insertion-ordered set of live keys.
///
/// - Front = oldest
/// - Back = youngest
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct KeyIndex {
    keys: Vec<String>,
}

impl KeyIndex {
    // == Constructor ==
    /// Builds an index from keys already in oldest-first order.
    pub fn from_keys(keys: Vec<String>) -> Self {
        Self { keys }
    }

    // == Decode ==
    /// Parses the persisted form.
    ///
    /// Rejects anything that is not an array of strings, and arrays that
    /// repeat a key or mention the reserved index key.
    pub fn decode(raw: &str) -> Result<Self> {
        let keys: Vec<String> =
            serde_json::from_str(raw).map_err(|e| StoreError::invalid_value(INDEX_KEY, e))?;

        let mut seen = HashSet::with_capacity(keys.len());
        for key in &keys {
            if key == INDEX_KEY {
                return Err(StoreError::invalid_value(
                    INDEX_KEY,
                    "index lists its own reserved key",
                ));
            }
            if !seen.insert(key.as_str()) {
                return Err(StoreError::invalid_value(
                    INDEX_KEY,
                    format!("duplicate key '{}'", key),
                ));
            }
        }

        Ok(Self { keys })
    }

    // == Encode ==
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(&self.keys)
            .map_err(|e| StoreError::Internal(format!("failed to encode index: {}", e)))
    }

    // == Touch ==
    /// Moves `key` to the youngest position, adding it if absent.
    pub fn touch(&mut self, key: &str) {
        self.remove(key);
        self.keys.push(key.to_string());
    }

    // == Remove ==
    /// Removes `key` if present. Returns whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.keys.iter().position(|k| k == key) {
            Some(pos) => {
                self.keys.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn into_keys(self) -> Vec<String> {
        self.keys
    }
}
