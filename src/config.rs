//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the store keeps
    pub max_items: usize,
    /// HTTP server port
    pub server_port: u16,
    /// Background expired-collection interval in seconds
    pub collect_interval: u64,
    /// File backing the store; in-memory when unset
    pub store_path: Option<PathBuf>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ITEMS` - Maximum stored entries (default: 1000)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `COLLECT_INTERVAL` - Expired-collection frequency in seconds (default: 1)
    /// - `STORE_PATH` - JSON file to persist entries in (default: unset, in-memory)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            max_items: env::var("MAX_ITEMS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or(defaults.max_items),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            collect_interval: env::var("COLLECT_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or(defaults.collect_interval),
            store_path: env::var_os("STORE_PATH")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_items: 1000,
            server_port: 3000,
            collect_interval: 1,
            store_path: None,
        }
    }
}
