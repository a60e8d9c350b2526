//! Poll and finalize endpoints used by the checkout page and the validating party.

use std::sync::Arc;

use axum::Form;
use axum::Json;
use axum::extract::rejection::FormRejection;
use axum::extract::{Query, State};
use checkout::ProtocolResponse;
use serde::Deserialize;

use super::transactions::AppState;

/// `uid` parameter of `/validate`. A missing `uid` is answered with `invalid_id`.
#[derive(Debug, Deserialize)]
pub struct ValidateParams {
    pub uid: Option<String>,
}

/// GET /validate?uid= — report status, price and store of a transaction.
#[tracing::instrument(skip(state))]
pub async fn poll(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ValidateParams>,
) -> Json<ProtocolResponse> {
    Json(state.protocol.poll(params.uid.as_deref()).await)
}

/// POST /validate — finalize a transaction.
///
/// `uid` may come as a form field or in the query string; a non-blank form
/// field wins.
#[tracing::instrument(skip(state, form))]
pub async fn finalize(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ValidateParams>,
    form: Result<Form<ValidateParams>, FormRejection>,
) -> Json<ProtocolResponse> {
    let from_body = form
        .ok()
        .and_then(|Form(body)| body.uid)
        .filter(|uid| !uid.trim().is_empty());
    let uid = from_body.or(params.uid);

    Json(state.protocol.finalize(uid.as_deref()).await)
}
