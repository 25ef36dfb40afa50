//! Handlers for authentication and session context.
//!
//! | Method   | Path                | Notes |
//! |----------|---------------------|-------|
//! | `POST`   | `/auth/login`       | Body: `{"tax_id":…, "password":…}` |
//! | `POST`   | `/auth/logout`      | Revokes the bearer session |
//! | `GET`    | `/session`          | Current session incl. active context |
//! | `GET`    | `/session/contexts` | Available (group, role) pairs |
//! | `PUT`    | `/session/context`  | Body: `{"group_id":…, "role":…}`; 422 on mismatch |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Duration, Utc};
use domus_core::{
  context,
  membership::Role,
  session::{ActiveContext, NewSession},
  store::DirectoryStore,
};
use domus_cpf::Cpf;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, auth, auth::CurrentSession, error::ApiError, token};

// ─── Login / logout ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub tax_id:   String,
  pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
  /// Shown exactly once; only a digest is stored.
  pub token:       String,
  pub session_id:  Uuid,
  pub identity_id: Uuid,
  pub expires_at:  DateTime<Utc>,
}

/// `POST /auth/login`
///
/// A malformed tax ID, an unknown one, and a wrong password all produce the
/// same 401 — no account probing.
pub async fn login(
  State(state): State<AppState>,
  Json(body): Json<LoginBody>,
) -> Result<impl IntoResponse, ApiError> {
  let Ok(tax_id) = Cpf::parse(&body.tax_id) else {
    return Err(ApiError::Unauthorized);
  };

  let identity = state
    .store
    .find_identity_by_tax_id(&tax_id)
    .await?
    .ok_or(ApiError::Unauthorized)?;

  if !auth::verify_password(&body.password, &identity.password_hash) {
    return Err(ApiError::Unauthorized);
  }

  let (plaintext, digest) = token::issue();
  let session = state
    .store
    .create_session(NewSession {
      identity_id:  identity.identity_id,
      token_digest: digest,
      expires_at:   Utc::now() + Duration::hours(state.config.session_ttl_hours),
    })
    .await?;
  state.store.touch_login(identity.identity_id).await?;

  tracing::info!(identity_id = %identity.identity_id, "login");

  Ok((
    StatusCode::CREATED,
    Json(LoginResponse {
      token:       plaintext,
      session_id:  session.session_id,
      identity_id: identity.identity_id,
      expires_at:  session.expires_at,
    }),
  ))
}

/// `POST /auth/logout`
pub async fn logout(
  State(state): State<AppState>,
  caller: CurrentSession,
) -> Result<StatusCode, ApiError> {
  state.store.revoke_session(caller.session.session_id).await?;
  tracing::info!(identity_id = %caller.identity.identity_id, "logout");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Session state ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SessionSummary {
  pub session_id:     Uuid,
  pub identity_id:    Uuid,
  pub display_name:   String,
  pub expires_at:     DateTime<Utc>,
  /// Stored context, read lazily — not re-validated against memberships.
  pub active_context: Option<ActiveContext>,
}

/// `GET /session`
pub async fn get_session(
  caller: CurrentSession,
) -> Json<SessionSummary> {
  Json(SessionSummary {
    session_id:     caller.session.session_id,
    identity_id:    caller.identity.identity_id,
    display_name:   caller.identity.display_name.clone(),
    expires_at:     caller.session.expires_at,
    active_context: context::get_active_context(&caller.session),
  })
}

/// `GET /session/contexts`
pub async fn list_contexts(
  State(state): State<AppState>,
  caller: CurrentSession,
) -> Result<Json<Vec<ActiveContext>>, ApiError> {
  let contexts =
    context::list_contexts(&state.store, caller.identity.identity_id).await?;
  Ok(Json(contexts))
}

#[derive(Debug, Deserialize)]
pub struct SetContextBody {
  pub group_id: Uuid,
  pub role:     String,
}

/// `PUT /session/context`
pub async fn set_context(
  State(state): State<AppState>,
  caller: CurrentSession,
  Json(body): Json<SetContextBody>,
) -> Result<Json<ActiveContext>, ApiError> {
  let role: Role = body
    .role
    .parse()
    .map_err(|e: domus_core::Error| ApiError::BadRequest(e.to_string()))?;

  let ctx =
    context::set_active_context(&state.store, &caller.session, body.group_id, role)
      .await?;
  Ok(Json(ctx))
}
