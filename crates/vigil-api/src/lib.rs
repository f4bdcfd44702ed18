//! Vigil API /v1: REST endpoints
pub mod error;
pub mod handlers;
pub mod middleware;

use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use vigil_workflow::{EngineMetrics, ReviewService};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ReviewService>,
    pub metrics: EngineMetrics,
}

impl AppState {
    pub fn new(service: ReviewService, metrics: EngineMetrics) -> Self {
        Self {
            service: Arc::new(service.with_metrics(metrics.clone())),
            metrics,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route(
            "/v1/reports",
            post(handlers::submit).get(handlers::list_reports),
        )
        .route("/v1/reports/bulk-status", patch(handlers::bulk_update_status))
        .route("/v1/reports/{id}", get(handlers::get_report))
        .route("/v1/reports/{id}/scoring", get(handlers::get_scoring))
        .route("/v1/reports/{id}/history", get(handlers::get_history))
        .route("/v1/reports/{id}/status", patch(handlers::update_status))
        .route("/v1/reports/{id}/evidence", post(handlers::attach_evidence))
        .route("/v1/stats", get(handlers::stats))
        .route("/v1/config/thresholds", get(handlers::thresholds))
        .route("/v1/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors())
        .with_state(state)
}

pub async fn run(addr: &str, state: AppState) -> std::io::Result<()> {
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Vigil API listening on {}", addr);
    axum::serve(listener, app).await
}
