//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use carehub_core::report::{FailureKind, UpdateFailure};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// A failed multi-group update; rendered with its partial report.
  #[error(transparent)]
  Update(#[from] UpdateFailure),
}

impl From<carehub_core::Error> for ApiError {
  fn from(e: carehub_core::Error) -> Self {
    match e {
      carehub_core::Error::Store(source) => ApiError::Store(source),
      e if e.is_validation() => ApiError::BadRequest(e.to_string()),
      e => ApiError::Store(Box::new(e)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::NotFound(m) => {
        (StatusCode::NOT_FOUND, Json(json!({ "error": m }))).into_response()
      }
      ApiError::BadRequest(m) => {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": m }))).into_response()
      }
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store request failed");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          Json(json!({ "error": "internal server error" })),
        )
          .into_response()
      }
      ApiError::Update(failure) => {
        let status = match failure.kind() {
          FailureKind::Validation => StatusCode::BAD_REQUEST,
          FailureKind::StoreWrite | FailureKind::Internal => {
            StatusCode::INTERNAL_SERVER_ERROR
          }
        };
        if status.is_server_error() {
          let cause = std::error::Error::source(&failure.error)
            .map(ToString::to_string)
            .unwrap_or_default();
          tracing::error!(error = %failure, %cause, "participant update failed");
        }
        (status, Json(failure.body())).into_response()
      }
    }
  }
}
