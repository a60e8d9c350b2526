//! Transaction creation for the checkout page.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use checkout::{JobRegistry, SweeperStatus, ValidationProtocol};
use common::Money;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub registry: JobRegistry,
    pub protocol: ValidationProtocol,
    /// Liveness of the timeout sweeper, when one was spawned.
    pub sweeper: Option<SweeperStatus>,
}

impl AppState {
    pub fn new(registry: JobRegistry, sweeper: Option<SweeperStatus>) -> Self {
        Self {
            protocol: ValidationProtocol::new(registry.clone()),
            registry,
            sweeper,
        }
    }
}

// -- Request types --

/// Cart total computed by the cart collaborator.
#[derive(Deserialize)]
pub struct CreateCheckoutRequest {
    pub total_cents: i64,
}

// -- Response types --

/// What the checkout page needs to render the scannable code and start polling.
#[derive(Serialize)]
pub struct CheckoutCreatedResponse {
    pub transaction_id: String,
    pub price: f64,
    pub store: String,
    pub status: String,
    pub created_at: String,
}

// -- Handlers --

/// POST /checkout — mint a transaction id for the cart total.
#[tracing::instrument(skip(state, payload))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateCheckoutRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CheckoutCreatedResponse>), ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let job = state
        .registry
        .create_transaction(Money::from_cents(req.total_cents))
        .await?;

    let response = CheckoutCreatedResponse {
        transaction_id: job.id().to_string(),
        price: job.price().as_decimal(),
        store: job.store_label().to_string(),
        status: job.status().to_string(),
        created_at: job.created_at().to_rfc3339(),
    };

    Ok((StatusCode::CREATED, Json(response)))
}
