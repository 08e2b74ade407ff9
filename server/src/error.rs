//! API Error Types
//!
//! The two user-facing failures: a malformed request (400) and a failed call
//! to a remote backend (502).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;
use crate::wechat::client::PlatformError;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request body did not match the expected schema.
    #[error("receives malformed POST content (proper schema: '{schema}')")]
    Malformed {
        /// Example of a well-formed body.
        schema: &'static str,
    },

    /// Other request validation failure.
    #[error("{0}")]
    BadRequest(String),

    /// Uploaded file exceeds the configured limit.
    #[error("File too large (max: {max})")]
    TooLarge {
        /// Human-readable limit.
        max: String,
    },

    /// A remote backend rejected or failed the call.
    #[error("{message}")]
    BadGateway {
        /// Backend error code, when the backend supplied one.
        code: Option<i64>,
        /// Backend error message.
        message: String,
    },
}

/// Error response body for JSON responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Backend error code, passed through on gateway failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    /// Human-readable error message.
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, code) = match &self {
            Self::Malformed { .. } | Self::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", None)
            }
            Self::TooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "FILE_TOO_LARGE", None),
            Self::BadGateway { code, .. } => {
                tracing::warn!(code = ?code, message = %self, "Backend call failed");
                (StatusCode::BAD_GATEWAY, "BAD_GATEWAY", *code)
            }
        };

        let body = Json(ErrorResponse {
            error,
            code,
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::BadGateway {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

impl From<PlatformError> for ApiError {
    fn from(err: PlatformError) -> Self {
        Self::BadGateway {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
