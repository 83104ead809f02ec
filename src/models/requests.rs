//! Request DTOs for the store API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;
use serde_json::Value;

use crate::store::{INDEX_KEY, MAX_KEY_LENGTH};

/// Request body for the SET operation (PUT /set)
///
/// # Fields
/// - `key`: The key to store the value under
/// - `value`: The value to store; `null` deletes the key. Required.
/// - `ttl`: Optional lifetime in seconds
/// - `expires_at`: Optional absolute expiration (Unix milliseconds)
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The store key
    pub key: String,
    /// The value to store
    pub value: Value,
    /// Optional TTL in seconds
    #[serde(default)]
    pub ttl: Option<u64>,
    /// Optional expiration timestamp in Unix milliseconds
    #[serde(default)]
    pub expires_at: Option<u64>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if self.key.len() > MAX_KEY_LENGTH {
            return Some(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            ));
        }
        if self.key == INDEX_KEY {
            return Some(format!("Key '{}' is reserved", INDEX_KEY));
        }
        if self.ttl.is_some() && self.expires_at.is_some() {
            return Some("Specify at most one of ttl and expires_at".to_string());
        }
        None
    }

    /// The value to store, or `None` when the request is a delete.
    pub fn stored_value(&self) -> Option<Value> {
        match &self.value {
            Value::Null => None,
            value => Some(value.clone()),
        }
    }

    /// Resolves `ttl` / `expires_at` into an absolute expiration at `now_ms`.
    pub fn expiration(&self, now_ms: u64) -> Option<u64> {
        self.expires_at.or_else(|| {
            self.ttl
                .map(|ttl| now_ms.saturating_add(ttl.saturating_mul(1000)))
        })
    }
}

/// Query string for POST /collect/expired
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollectExpiredQuery {
    #[serde(default)]
    pub strict: bool,
}

/// Query string for POST /collect/oversize
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollectOversizeQuery {
    #[serde(default)]
    pub skip_expired: bool,
    #[serde(default)]
    pub strict: bool,
}
