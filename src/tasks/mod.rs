//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expired collection: removes expired entries at the configured interval

mod collect;

pub use collect::spawn_collect_task;
