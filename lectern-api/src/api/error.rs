//! API Error Handling
//!
//! Unified error types and conversion for API responses. Every error body is
//! an [`ErrorBody`] with a stable machine code.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lectern_core::dto::error::{ErrorBody, codes};

use crate::repository::LedgerError;
use crate::service::account::AccountError;
use crate::service::callback::CallbackError;
use crate::service::recovery::RecoveryError;
use crate::service::status::StatusError;
use crate::service::submission::SubmitError;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    NotFound { code: &'static str, message: String },
    BadRequest { code: &'static str, message: String },
    Unauthorized(String),
    PaymentRequired(String),
    Conflict(String),
    UnprocessableEntity { code: &'static str, message: String },
    BadGateway(String),
    LedgerError(LedgerError),
    InternalError(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            code: codes::VALIDATION_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::NotFound { code, message } => (StatusCode::NOT_FOUND, code, message),
            ApiError::BadRequest { code, message } => (StatusCode::BAD_REQUEST, code, message),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, codes::INVALID_SIGNATURE, msg),
            ApiError::PaymentRequired(msg) => {
                (StatusCode::PAYMENT_REQUIRED, codes::INSUFFICIENT_CREDIT, msg)
            }
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, codes::INVALID_STATE, msg),
            ApiError::UnprocessableEntity { code, message } => {
                (StatusCode::UNPROCESSABLE_ENTITY, code, message)
            }
            ApiError::BadGateway(msg) => {
                tracing::warn!("Upstream error: {}", msg);
                (StatusCode::BAD_GATEWAY, codes::DISPATCH_FAILED, msg)
            }
            ApiError::LedgerError(err) => {
                tracing::error!("Ledger error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    codes::INTERNAL_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    codes::INTERNAL_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: message,
            code: code.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::LedgerError(err)
    }
}

impl From<SubmitError> for ApiError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Validation(msg) => ApiError::validation(msg),
            SubmitError::AccountNotFound(owner) => ApiError::NotFound {
                code: codes::ACCOUNT_NOT_FOUND,
                message: format!("Account {} not found", owner),
            },
            e @ SubmitError::InsufficientCredit { .. } => ApiError::PaymentRequired(e.to_string()),
            e @ SubmitError::InputReferenceMissing(_) => ApiError::UnprocessableEntity {
                code: codes::INPUT_REFERENCE_MISSING,
                message: e.to_string(),
            },
            SubmitError::Storage(err) => ApiError::InternalError(err.to_string()),
            SubmitError::Ledger(err) => ApiError::LedgerError(err),
        }
    }
}

impl From<CallbackError> for ApiError {
    fn from(err: CallbackError) -> Self {
        match err {
            CallbackError::InvalidSignature(e) => ApiError::Unauthorized(e.to_string()),
            CallbackError::MalformedPayload(msg) => ApiError::BadRequest {
                code: codes::MALFORMED_PAYLOAD,
                message: msg,
            },
            CallbackError::UnknownJob(id) => ApiError::NotFound {
                code: codes::UNKNOWN_JOB,
                message: format!("Job {} not found", id),
            },
            CallbackError::Ledger(err) => ApiError::LedgerError(err),
        }
    }
}

impl From<StatusError> for ApiError {
    fn from(err: StatusError) -> Self {
        match err {
            StatusError::NotFound(id) => ApiError::NotFound {
                code: codes::JOB_NOT_FOUND,
                message: format!("Job {} not found", id),
            },
            StatusError::Ledger(err) => ApiError::LedgerError(err),
        }
    }
}

impl From<RecoveryError> for ApiError {
    fn from(err: RecoveryError) -> Self {
        match err {
            RecoveryError::NotFound(id) => ApiError::NotFound {
                code: codes::JOB_NOT_FOUND,
                message: format!("Job {} not found", id),
            },
            RecoveryError::InvalidState(msg) => ApiError::Conflict(msg),
            RecoveryError::InvalidThreshold(msg) => ApiError::validation(msg),
            RecoveryError::Dispatch(err) => ApiError::BadGateway(err.to_string()),
            RecoveryError::Ledger(err) => ApiError::LedgerError(err),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::NotFound(owner) => ApiError::NotFound {
                code: codes::ACCOUNT_NOT_FOUND,
                message: format!("Account {} not found", owner),
            },
            AccountError::Validation(msg) => ApiError::validation(msg),
            AccountError::Ledger(err) => ApiError::LedgerError(err),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_submit_errors_map_to_distinct_statuses() {
        let cases = [
            (
                SubmitError::InsufficientCredit { owner: "a".into() },
                StatusCode::PAYMENT_REQUIRED,
            ),
            (SubmitError::AccountNotFound("a".into()), StatusCode::NOT_FOUND),
            (
                SubmitError::InputReferenceMissing("k".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (SubmitError::Validation("bad".into()), StatusCode::BAD_REQUEST),
        ];

        for (err, expected) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn test_callback_errors_map_to_distinct_statuses() {
        use lectern_core::signature::SignatureError;

        let unauthorized = ApiError::from(CallbackError::InvalidSignature(SignatureError::Mismatch));
        assert_eq!(unauthorized.into_response().status(), StatusCode::UNAUTHORIZED);

        let unknown = ApiError::from(CallbackError::UnknownJob(Uuid::new_v4()));
        assert_eq!(unknown.into_response().status(), StatusCode::NOT_FOUND);

        let malformed = ApiError::from(CallbackError::MalformedPayload("x".into()));
        assert_eq!(malformed.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
