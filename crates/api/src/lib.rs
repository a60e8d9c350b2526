//! HTTP surface for the scan-to-pay checkout service.
//!
//! Exposes transaction creation for the checkout page and the `/validate`
//! poll/finalize protocol for the validating party, with structured logging
//! (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use checkout::{JobRegistry, SweeperStatus};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::transactions::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/checkout", post(routes::transactions::create))
        .route(
            "/validate",
            get(routes::validate::poll).post(routes::validate::finalize),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state around an injected registry.
///
/// With a sweeper status, `/health` fails once the sweeper has stopped.
pub fn create_state(registry: JobRegistry, sweeper: Option<SweeperStatus>) -> Arc<AppState> {
    Arc::new(AppState::new(registry, sweeper))
}
