//! Envelope Module
//!
//! The expiration wrapper stored under every user key: the raw value plus its
//! creation timestamp and optional expiration timestamp.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, StoreError};

// == Envelope ==
/// A stored value with its timing metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Envelope {
    /// The stored value
    pub value: Value,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    #[serde(default)]
    pub expires_at: Option<u64>,
}

impl Envelope {
    pub fn new(value: Value, created_at: u64, expires_at: Option<u64>) -> Self {
        Self {
            value,
            created_at,
            expires_at,
        }
    }

    // == Is Expired ==
    /// Checks if the envelope has expired at `now`.
    ///
    /// An envelope is expired once `now` reaches its expiration time, so the
    /// boundary instant itself already counts as expired.
    pub fn is_expired(&self, now: u64) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds at `now`.
    ///
    /// # Returns
    /// - `Some(0)` if the envelope has expired
    /// - `Some(remaining_ms)` if it has an expiration that hasn't passed
    /// - `None` if it never expires
    pub fn ttl_remaining_ms(&self, now: u64) -> Option<u64> {
        self.expires_at.map(|expires| expires.saturating_sub(now))
    }
}

// == Codec ==
/// Serializes `value` into its stored form.
pub fn wrap(value: Value, created_at: u64, expires_at: Option<u64>) -> Result<String> {
    serde_json::to_string(&Envelope::new(value, created_at, expires_at))
        .map_err(|e| StoreError::Internal(format!("failed to encode envelope: {}", e)))
}

/// Parses the stored form read from `key`.
///
/// Fails with `InvalidValue` when `raw` is not a well-formed envelope.
pub fn unwrap(key: &str, raw: &str) -> Result<Envelope> {
    serde_json::from_str(raw).map_err(|e| StoreError::invalid_value(key, e))
}
