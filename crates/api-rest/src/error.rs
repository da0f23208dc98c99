//! Mapping from ledger errors to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use medledger_core::{ErrorKind, LedgerError, StoreError};
use serde::Serialize;
use utoipa::ToSchema;

/// Body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
    /// Machine-readable error class, e.g. `not_found` or `conflict`.
    pub kind: String,
}

#[derive(Debug)]
pub enum ApiError {
    Ledger(LedgerError),
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::Ledger(err)
    }
}

impl ApiError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            ApiError::Ledger(LedgerError::Store(StoreError::Unavailable(_))) => {
                (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
            }
            ApiError::Ledger(err) => match err.kind() {
                ErrorKind::NotFound => (StatusCode::NOT_FOUND, "not_found"),
                ErrorKind::AlreadyExists => (StatusCode::CONFLICT, "already_exists"),
                ErrorKind::Conflict => (StatusCode::CONFLICT, "conflict"),
                ErrorKind::InvalidInput => (StatusCode::BAD_REQUEST, "invalid_input"),
                ErrorKind::DanglingReference => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "dangling_reference")
                }
                ErrorKind::Codec => (StatusCode::INTERNAL_SERVER_ERROR, "codec"),
                ErrorKind::UnderlyingStore => (StatusCode::INTERNAL_SERVER_ERROR, "store"),
                ErrorKind::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            },
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Ledger(err) => err.to_string(),
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) | ApiError::Internal(msg) => {
                msg.clone()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        let error = self.message();
        if status.is_server_error() {
            tracing::error!(%status, kind, "request failed: {error}");
        } else {
            tracing::debug!(%status, kind, "request rejected: {error}");
        }
        (
            status,
            Json(ErrorRes {
                error,
                kind: kind.to_owned(),
            }),
        )
            .into_response()
    }
}
