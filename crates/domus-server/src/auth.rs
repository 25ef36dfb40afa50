//! Bearer-token extractor and argon2 password helpers.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::Utc;
use domus_core::{identity::Identity, session::Session, store::DirectoryStore};
use rand_core::OsRng;

use crate::{AppState, error::ApiError, token};

/// The authenticated caller: resolved session plus its identity.
///
/// Extraction fails with 401 when the token is missing or unknown, the
/// session is expired or revoked, or the identity has been deactivated.
pub struct CurrentSession {
  pub session:  Session,
  pub identity: Identity,
}

impl FromRequestParts<AppState> for CurrentSession {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState,
  ) -> Result<Self, Self::Rejection> {
    let header_val = parts
      .headers
      .get(axum::http::header::AUTHORIZATION)
      .and_then(|v| v.to_str().ok())
      .ok_or(ApiError::Unauthorized)?;

    let presented = header_val
      .strip_prefix("Bearer ")
      .ok_or(ApiError::Unauthorized)?;

    let session = state
      .store
      .find_session_by_token_digest(&token::digest(presented))
      .await?
      .ok_or(ApiError::Unauthorized)?;

    if !session.is_open(Utc::now()) {
      return Err(ApiError::Unauthorized);
    }

    let identity = state
      .store
      .get_identity(session.identity_id)
      .await?
      .filter(|i| i.active)
      .ok_or(ApiError::Unauthorized)?;

    Ok(CurrentSession { session, identity })
  }
}

/// Produce an argon2 PHC string for storage.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::Store(Box::new(std::io::Error::other(e.to_string()))))
}

/// Constant-result verification; any parse or mismatch is a plain `false`.
pub fn verify_password(password: &str, phc: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(phc) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}
