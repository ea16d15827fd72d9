//! Callback API Handler
//!
//! The body is taken as raw bytes: the signature covers exactly what the
//! worker sent, so it must be verified before any JSON parsing.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
};
use lectern_core::dto::callback::{CallbackAck, SIGNATURE_HEADER};

use crate::api::error::ApiResult;
use crate::service::callback_service;
use crate::state::AppState;

/// POST /callback
/// Outcome report from the worker
pub async fn receive_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<CallbackAck>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    callback_service::receive_outcome(
        state.ledger.as_ref(),
        &state.callback_secret,
        &body,
        signature,
    )
    .await?;

    Ok(Json(CallbackAck::accepted()))
}
