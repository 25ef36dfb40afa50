//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
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

  /// Context selection failed validation (422, not 403 — the request is
  /// well-formed but names a context the identity does not hold exactly).
  #[error("invalid context: {0}")]
  InvalidContext(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
      // No reason detail on denials.
      ApiError::Forbidden => (StatusCode::FORBIDDEN, "forbidden".to_string()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::InvalidContext(m) => (StatusCode::UNPROCESSABLE_ENTITY, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

impl From<domus_store_sqlite::Error> for ApiError {
  fn from(e: domus_store_sqlite::Error) -> Self {
    use domus_store_sqlite::Error as E;
    match e {
      E::IdentityNotFound(_) | E::GroupNotFound(_) | E::SessionNotFound(_) => {
        ApiError::NotFound(e.to_string())
      }
      E::MembershipNotFound { .. } => ApiError::NotFound(e.to_string()),
      E::DuplicateMembership { .. }
      | E::DuplicateTaxId
      | E::DuplicateGroupName(_)
      | E::GroupNotEmpty { .. } => ApiError::Conflict(e.to_string()),
      E::Core(domus_core::Error::UnknownRole(_))
      | E::Core(domus_core::Error::InvalidTaxId(_)) => ApiError::BadRequest(e.to_string()),
      other => ApiError::Store(Box::new(other)),
    }
  }
}

impl From<domus_core::context::ContextError<domus_store_sqlite::Error>> for ApiError {
  fn from(e: domus_core::context::ContextError<domus_store_sqlite::Error>) -> Self {
    match e {
      domus_core::context::ContextError::NotHeld { .. } => {
        ApiError::InvalidContext(e.to_string())
      }
      domus_core::context::ContextError::Store(inner) => inner.into(),
    }
  }
}
