//! API request handlers.

use std::io;

use axum::Json;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use futures::{StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::AppState;
use crate::error::ApiError;

/// JSON body of every non-binary response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// `success`, `error`, or `health`.
    pub status: String,
    /// Human-readable outcome.
    pub message: String,
}

impl ApiResponse {
    /// A `success` response.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
        }
    }

    /// An `error` response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}

// -----------------------------------------------------------------------
// GET /health
// -----------------------------------------------------------------------

pub(crate) async fn health() -> Json<ApiResponse> {
    Json(ApiResponse {
        status: "health".to_string(),
        message: "OK".to_string(),
    })
}

// -----------------------------------------------------------------------
// PUT /api/v1/object/{id}
// -----------------------------------------------------------------------

/// Declared body length, if present and positive.
fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse::<u64>()
        .ok()
        .filter(|&len| len > 0)
}

pub(crate) async fn put_object(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Body,
) -> Result<(StatusCode, Json<ApiResponse>), ApiError> {
    let size = content_length(&headers).ok_or(ApiError::MissingContentLength)?;

    // The body is streamed to the owning node as it arrives.
    let data = body.into_data_stream().map_err(io::Error::other).boxed();
    state
        .gateway
        .put_object(&id, data, size)
        .await
        .map_err(ApiError::store)?;

    info!(object = %id, size, "object stored");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(format!(
            "Object {id} stored successfully"
        ))),
    ))
}

// -----------------------------------------------------------------------
// GET /api/v1/object/{id}
// -----------------------------------------------------------------------

pub(crate) async fn get_object(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let data = state
        .gateway
        .get_object(&id)
        .await
        .map_err(ApiError::retrieve)?;

    Ok((
        [(CONTENT_TYPE, "application/octet-stream")],
        Body::from_stream(data),
    )
        .into_response())
}
