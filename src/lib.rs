//! Bounded Store - a bounded, self-indexing key/value layer
//!
//! Keeps at most N entries over a flat key/value mechanism, collecting
//! expired entries first and then evicting the oldest ones.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use error::{Result, StoreError};
pub use store::BoundedIndexStore;
pub use tasks::spawn_collect_task;
