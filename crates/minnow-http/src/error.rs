//! API error type and JSON error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use minnow_gateway::{GatewayError, ValidationError};
use tracing::error;

use crate::handlers::ApiResponse;

/// Errors returned by API handlers.
///
/// The `Display` text is exactly the message sent to the client; details of
/// backend failures are logged, never returned.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The object identifier is malformed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// PUT without a positive `Content-Length`.
    #[error("Content-Length header is required")]
    MissingContentLength,

    /// No object under the requested identifier.
    #[error("Object not found")]
    ObjectNotFound,

    /// The gateway has no storage nodes at all.
    #[error("No storage nodes available")]
    Unavailable,

    /// A store failed on the backend side.
    #[error("Failed to store object")]
    StoreFailed,

    /// A retrieve failed on the backend side.
    #[error("Failed to retrieve object")]
    RetrieveFailed,

    /// A handler panicked.
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    /// Classify a gateway error from a store request.
    pub(crate) fn store(err: GatewayError) -> Self {
        match err {
            GatewayError::Validation(e) => Self::Validation(e),
            GatewayError::NoNodesAvailable => Self::Unavailable,
            other => {
                error!(error = %other, "failed to store object");
                Self::StoreFailed
            }
        }
    }

    /// Classify a gateway error from a retrieve request.
    pub(crate) fn retrieve(err: GatewayError) -> Self {
        match err {
            GatewayError::Validation(e) => Self::Validation(e),
            GatewayError::ObjectNotFound { .. } => Self::ObjectNotFound,
            GatewayError::NoNodesAvailable => Self::Unavailable,
            other => {
                error!(error = %other, "failed to retrieve object");
                Self::RetrieveFailed
            }
        }
    }

    /// Map to an HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::MissingContentLength => StatusCode::BAD_REQUEST,
            Self::ObjectNotFound => StatusCode::NOT_FOUND,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::StoreFailed | Self::RetrieveFailed | Self::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(ApiResponse::error(self.to_string()))).into_response()
    }
}
