//! API Module
//!
//! HTTP handlers and routing for the bounded store REST API.
//!
//! # Endpoints
//! - `PUT /set` - Store a value (null value deletes)
//! - `GET /get/:key` - Retrieve a value by key
//! - `DELETE /del/:key` - Delete a key
//! - `GET /keys` - List live keys, oldest first
//! - `POST /collect/expired` - Remove expired entries
//! - `POST /collect/oversize` - Enforce the entry bound
//! - `GET /stats` - Store statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
