//! Account API Handlers

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use lectern_core::domain::account::Account;
use lectern_core::dto::account::GrantCredits;

use crate::api::error::{ApiError, ApiResult};
use crate::service::account_service;
use crate::state::AppState;

/// GET /accounts/{owner}
pub async fn get_account(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> ApiResult<Json<Account>> {
    let account = account_service::get_account(state.ledger.as_ref(), &owner).await?;
    Ok(Json(account))
}

/// POST /accounts/{owner}/credits
/// Payment confirmation hook
pub async fn grant_credits(
    State(state): State<AppState>,
    Path(owner): Path<String>,
    payload: Result<Json<GrantCredits>, JsonRejection>,
) -> ApiResult<Json<Account>> {
    let Json(req) = payload.map_err(|e| ApiError::validation(e.body_text()))?;

    let account = account_service::grant_credits(state.ledger.as_ref(), &owner, req.credits).await?;
    Ok(Json(account))
}
