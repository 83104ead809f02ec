//! API Routes
//!
//! Configures the Axum router with all store endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    collect_expired_handler, collect_oversize_handler, delete_handler, get_handler,
    health_handler, keys_handler, set_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /set` - Store a value (null value deletes)
/// - `GET /get/:key` - Retrieve a value by key
/// - `DELETE /del/:key` - Delete a key
/// - `GET /keys` - List live keys, oldest first
/// - `POST /collect/expired` - Remove expired entries
/// - `POST /collect/oversize` - Enforce the entry bound
/// - `GET /stats` - Store statistics
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/set", put(set_handler))
        .route("/get/:key", get(get_handler))
        .route("/del/:key", delete(delete_handler))
        .route("/keys", get(keys_handler))
        .route("/collect/expired", post(collect_expired_handler))
        .route("/collect/oversize", post(collect_oversize_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::store::{BoundedIndexStore, MemoryMechanism, SystemClock};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        let store =
            BoundedIndexStore::new(Box::new(MemoryMechanism::new()), Arc::new(SystemClock), 100)
                .unwrap();
        create_router(AppState::new(store))
    }

    async fn status_of(request: Request<Body>) -> StatusCode {
        create_test_app().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        assert_eq!(status_of(request).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_set_endpoint() {
        let request = Request::builder()
            .method("PUT")
            .uri("/set")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"key":"test","value":"hello"}"#))
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let request = Request::builder()
            .uri("/get/nonexistent")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_collect_endpoints() {
        for uri in ["/collect/expired?strict=true", "/collect/oversize?skip_expired=true"] {
            let request = Request::builder()
                .method("POST")
                .uri(uri)
                .body(Body::empty())
                .unwrap();
            assert_eq!(status_of(request).await, StatusCode::OK, "{uri}");
        }
    }
}
