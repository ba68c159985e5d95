//! Error to HTTP response mapping.
//!
//! Every failure renders as `{"error": <CODE>, "message": <text>}` with the
//! status the domain error declares.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use stellar_core::LedgerError;
use stellar_core::access::AccessDenied;
use stellar_core::promotion::PromotionError;
use stellar_core::user::DirectoryError;
use stellar_shared::AppError;

/// Errors returned by route handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Ledger or redemption failure.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// User directory failure.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// Promotion catalog failure.
    #[error(transparent)]
    Promotion(#[from] PromotionError),

    /// Request-level failure (authentication, malformed input).
    #[error(transparent)]
    App(#[from] AppError),
}

impl From<AccessDenied> for ApiError {
    fn from(denied: AccessDenied) -> Self {
        Self::Ledger(denied.into())
    }
}

impl ApiError {
    /// Shorthand for a 400 validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::App(AppError::Validation(message.into()))
    }

    /// Returns the error code for the response body.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Ledger(e) => e.error_code(),
            Self::Directory(e) => e.error_code(),
            Self::Promotion(e) => e.error_code(),
            Self::App(e) => e.error_code(),
        }
    }

    /// Returns the HTTP status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        let code = match self {
            Self::Ledger(e) => e.http_status_code(),
            Self::Directory(e) => e.http_status_code(),
            Self::Promotion(e) => e.http_status_code(),
            Self::App(e) => e.status_code(),
        };
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        (
            status,
            Json(json!({
                "error": self.error_code(),
                "message": self.to_string(),
            })),
        )
            .into_response()
    }
}
