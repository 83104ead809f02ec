//! Expiring Store Module
//!
//! Base capability the bounded store is built on: wraps values in envelopes on
//! the way in, unwraps and checks expiration on the way out, and finds keys
//! that are due for collection.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::store::envelope::{self, Envelope};
use crate::store::{Clock, Mechanism};

// == Expiring Store ==
/// A mechanism plus a clock, speaking in envelopes.
#[derive(Debug)]
pub struct ExpiringStore {
    mechanism: Box<dyn Mechanism>,
    clock: Arc<dyn Clock>,
}

impl ExpiringStore {
    pub fn new(mechanism: Box<dyn Mechanism>, clock: Arc<dyn Clock>) -> Self {
        Self { mechanism, clock }
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn mechanism(&self) -> &dyn Mechanism {
        &*self.mechanism
    }

    pub(crate) fn mechanism_mut(&mut self) -> &mut dyn Mechanism {
        &mut *self.mechanism
    }

    // == Read Envelope ==
    /// Reads and parses the envelope under `key` without any expiration check.
    pub fn read_envelope(&self, key: &str) -> Result<Option<Envelope>> {
        match self.mechanism.get(key)? {
            Some(raw) => envelope::unwrap(key, &raw).map(Some),
            None => Ok(None),
        }
    }

    // == Get ==
    /// Returns the live envelope under `key`; expired entries read as absent.
    pub fn get_envelope(&self, key: &str) -> Result<Option<Envelope>> {
        let now = self.now_ms();
        Ok(self.read_envelope(key)?.filter(|env| !env.is_expired(now)))
    }

    /// Returns the live value under `key`.
    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.get_envelope(key)?.map(|env| env.value))
    }

    // == Set ==
    /// Wraps and stores `value` under `key`, stamped with the current time.
    ///
    /// `None` is the tombstone: the key is removed instead.
    pub fn set(&mut self, key: &str, value: Option<Value>, expires_at: Option<u64>) -> Result<()> {
        match value {
            Some(value) => {
                let raw = envelope::wrap(value, self.now_ms(), expires_at)?;
                self.mechanism.set(key, raw)
            }
            None => self.mechanism.remove(key),
        }
    }

    // == Remove ==
    pub fn remove(&mut self, key: &str) -> Result<()> {
        self.mechanism.remove(key)
    }

    // == Find Expired Or Invalid ==
    /// Returns the members of `keys` that are due for collection, in the
    /// order they appear in `keys`.
    ///
    /// A key is due when its envelope has expired or it no longer exists in
    /// the mechanism. With `strict`, keys holding malformed envelopes are due
    /// as well; otherwise they are left alone.
    pub fn find_expired_or_invalid(&self, keys: &[String], strict: bool) -> Result<Vec<String>> {
        let now = self.now_ms();
        let mut due = Vec::new();

        for key in keys {
            match self.read_envelope(key) {
                Ok(Some(env)) if env.is_expired(now) => due.push(key.clone()),
                Ok(Some(_)) => {}
                Ok(None) => {
                    debug!("Key '{}' is indexed but missing from the mechanism", key);
                    due.push(key.clone());
                }
                Err(StoreError::InvalidValue { .. }) if strict => due.push(key.clone()),
                Err(StoreError::InvalidValue { .. }) => {}
                Err(e) => return Err(e),
            }
        }

        Ok(due)
    }
}
