//! HTTP error mapping.
//!
//! Every handler returns [`ApiResult`]; the wrapped [`PortcullisError`]
//! decides the status code and the `{"detail": ...}` body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use portcullis_core::error::PortcullisError;
use serde::{Deserialize, Serialize};

/// Error returned by request handlers.
#[derive(Debug)]
pub struct ApiError(pub PortcullisError);

impl ApiError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            PortcullisError::NotFound { .. } => StatusCode::NOT_FOUND,
            // Duplicates are reported as forbidden rather than 409.
            PortcullisError::Conflict { .. } => StatusCode::FORBIDDEN,
            PortcullisError::BadRequest { .. } | PortcullisError::BadCredentials => {
                StatusCode::BAD_REQUEST
            }
            PortcullisError::Database(_)
            | PortcullisError::Crypto(_)
            | PortcullisError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PortcullisError> for ApiError {
    fn from(err: PortcullisError) -> Self {
        Self(err)
    }
}

/// Body of every error and confirmation response.
#[derive(Debug, Serialize, Deserialize)]
pub struct Detail {
    pub detail: String,
}

impl Detail {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = if self.0.is_client_error() {
            self.0.to_string()
        } else {
            tracing::error!(error = %self.0, "Request failed");
            "Internal server error".to_string()
        };
        (status, Json(Detail::new(detail))).into_response()
    }
}

/// Result type for request handlers.
pub type ApiResult<T> = Result<T, ApiError>;
