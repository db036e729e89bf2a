//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use campdash_sync::SyncError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler. Rendered as
/// `{"success": false, "error": "<message>"}`.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("forbidden")]
  Forbidden,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error(transparent)]
  Sync(SyncError),
}

impl From<SyncError> for ApiError {
  fn from(e: SyncError) -> Self {
    match e {
      SyncError::Range(e) => ApiError::BadRequest(e.to_string()),
      SyncError::MissingFields(_) => ApiError::BadRequest(e.to_string()),
      SyncError::DuplicateTenant(_) => ApiError::Conflict(e.to_string()),
      other => ApiError::Sync(other),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_owned()),
      ApiError::Forbidden => (StatusCode::FORBIDDEN, "Super admin access required".to_owned()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Sync(e) => {
        tracing::error!(error = %e, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };

    let mut res = (status, Json(json!({ "success": false, "error": message }))).into_response();
    if matches!(self, ApiError::Unauthorized) {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"campdash\""),
      );
    }
    res
  }
}
