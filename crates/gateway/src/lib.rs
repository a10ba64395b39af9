//! HTTP API gateway for Spiro.
//!
//! Exposes a health check and the v1 comment list endpoint.
//!
//! Built on Axum for high performance async HTTP.

pub mod comment_list;

use axum::{Router, http::Method, response::Json, routing::get};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use spiro_config::AppConfig;
use spiro_core::service::CommentListService;
use spiro_core::store::CommentStore;

pub use comment_list::{CommentListParams, CommentListResponse, ErrorEnvelope};

/// Shared application state for the gateway.
pub struct GatewayState {
    pub config: AppConfig,
    pub comments: CommentListService,
}

impl GatewayState {
    /// Wire a store into the comment service using the pagination settings of `config`.
    pub fn new(config: AppConfig, store: Arc<dyn CommentStore>) -> Self {
        let comments = CommentListService::new(store)
            .with_limits(config.pagination.limits())
            .with_serialized_reads(config.pagination.serialize_store_reads);
        Self { config, comments }
    }
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/comment_list", get(comment_list::comment_list_handler))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server.
pub async fn start(
    config: AppConfig,
    store: Arc<dyn CommentStore>,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let state = Arc::new(GatewayState::new(config, store));

    info!(addr = %addr, store = state.comments.store().name(), "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, build_router(state)).await?;

    Ok(())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use spiro_store::InMemoryStore;
    use tower::ServiceExt;

    fn test_state() -> SharedState {
        Arc::new(GatewayState::new(
            AppConfig::default(),
            Arc::new(InMemoryStore::new()),
        ))
    }

    #[tokio::test]
    async fn health_endpoint() {
        let app = build_router(test_state());

        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn post_not_allowed() {
        let app = build_router(test_state());

        let req = Request::builder()
            .method("POST")
            .uri("/v1/comment_list")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn state_wraps_given_store() {
        let state = GatewayState::new(AppConfig::default(), Arc::new(InMemoryStore::new()));
        assert_eq!(state.comments.store().name(), "memory");
    }

    #[tokio::test]
    async fn state_applies_pagination_caps() {
        let mut config = AppConfig::default();
        config.pagination.max_primary_comment_count = Some(50);
        let state = GatewayState::new(config, Arc::new(InMemoryStore::new()));
        assert_eq!(state.comments.limits().max_primary_count, Some(50));
    }
}
