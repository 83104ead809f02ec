//! API Handlers
//!
//! HTTP request handlers for each store endpoint.

use std::sync::Arc;
use tokio::sync::RwLock;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::models::{
    CollectExpiredQuery, CollectOversizeQuery, CollectResponse, DeleteResponse, GetResponse,
    HealthResponse, KeysResponse, SetRequest, SetResponse, StatsResponse,
};
use crate::store::{BoundedIndexStore, JsonFileMechanism, Mechanism, MemoryMechanism, SystemClock};

/// Application state shared across all handlers.
///
/// The store has a single logical owner; the RwLock provides it.
#[derive(Clone)]
pub struct AppState {
    /// Shared bounded store
    pub store: Arc<RwLock<BoundedIndexStore>>,
}

impl AppState {
    /// Creates a new AppState with the given store.
    pub fn new(store: BoundedIndexStore) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Uses a JSON file mechanism when `store_path` is set, memory otherwise.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mechanism: Box<dyn Mechanism> = match &config.store_path {
            Some(path) => Box::new(JsonFileMechanism::open(path)?),
            None => Box::new(MemoryMechanism::new()),
        };
        let store = BoundedIndexStore::new(mechanism, Arc::new(SystemClock), config.max_items)?;
        Ok(Self::new(store))
    }
}

/// Handler for PUT /set
///
/// Stores a value, or deletes the key when the value is null.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(StoreError::InvalidRequest(error_msg));
    }

    let mut store = state.store.write().await;
    let expires_at = req.expiration(store.now_ms());
    store.set(&req.key, req.stored_value(), expires_at)?;

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /get/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    // Write lock: reads update the hit/miss counters
    let mut store = state.store.write().await;
    let now = store.now_ms();
    let envelope = store
        .get_envelope(&key)?
        .ok_or_else(|| StoreError::NotFound(key.clone()))?;

    let ttl_ms = envelope.ttl_remaining_ms(now);
    Ok(Json(GetResponse::new(
        key,
        envelope.value,
        envelope.created_at,
        ttl_ms,
    )))
}

/// Handler for DELETE /del/:key
///
/// Deleting an absent key succeeds.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let mut store = state.store.write().await;
    store.remove(&key)?;

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for GET /keys
pub async fn keys_handler(State(state): State<AppState>) -> Result<Json<KeysResponse>> {
    let mut store = state.store.write().await;
    let keys = store.keys()?;

    Ok(Json(KeysResponse::new(keys)))
}

/// Handler for POST /collect/expired
pub async fn collect_expired_handler(
    State(state): State<AppState>,
    Query(query): Query<CollectExpiredQuery>,
) -> Result<Json<CollectResponse>> {
    let mut store = state.store.write().await;
    let removed = store.collect_expired(query.strict)?;

    Ok(Json(CollectResponse::new(
        removed,
        store.stats().total_entries,
    )))
}

/// Handler for POST /collect/oversize
pub async fn collect_oversize_handler(
    State(state): State<AppState>,
    Query(query): Query<CollectOversizeQuery>,
) -> Result<Json<CollectResponse>> {
    let mut store = state.store.write().await;
    let removed = store.collect_oversize(query.skip_expired, query.strict)?;

    Ok(Json(CollectResponse::new(
        removed,
        store.stats().total_entries,
    )))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let store = state.store.read().await;
    Json(StatsResponse::new(&store.stats(), store.max_items()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
