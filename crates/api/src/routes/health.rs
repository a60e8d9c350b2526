//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use checkout::CheckoutError;
use serde::Serialize;

use super::transactions::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub store: String,
    /// Jobs held in memory. Never shrinks, since jobs are not evicted.
    pub jobs_tracked: usize,
}

/// GET /health — returns service health and registry size.
///
/// Answers 503 once the timeout sweeper has stopped.
pub async fn check(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>, ApiError> {
    if let Some(sweeper) = &state.sweeper
        && !sweeper.is_running()
    {
        return Err(CheckoutError::SweeperFatal("timeout sweeper is not running".to_string()).into());
    }

    Ok(Json(HealthResponse {
        status: "ok",
        store: state.registry.config().store_label.to_string(),
        jobs_tracked: state.registry.len().await,
    }))
}
