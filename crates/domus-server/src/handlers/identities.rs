//! Handlers for `/identities` endpoints.
//!
//! | Method   | Path               | Notes |
//! |----------|--------------------|-------|
//! | `POST`   | `/identities`      | Open registration; 400 on bad CPF, 409 on reuse |
//! | `GET`    | `/identities`      | Optional `?active_only=false` |
//! | `GET`    | `/identities/{id}` | 404 if not found |
//! | `DELETE` | `/identities/{id}` | Soft; self-service only |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use domus_core::{identity::{Identity, NewIdentity}, store::DirectoryStore};
use domus_cpf::Cpf;
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, auth, auth::CurrentSession, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub tax_id:       String,
  pub display_name: String,
  pub password:     String,
}

/// `POST /identities`
pub async fn create(
  State(state): State<AppState>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let tax_id = Cpf::parse(&body.tax_id)
    .map_err(|e| ApiError::BadRequest(format!("invalid tax id: {e}")))?;
  let password_hash = auth::hash_password(&body.password)?;

  let identity = state
    .store
    .add_identity(NewIdentity {
      tax_id,
      display_name: body.display_name,
      password_hash,
    })
    .await?;

  tracing::info!(identity_id = %identity.identity_id, "identity registered");
  Ok((StatusCode::CREATED, Json(identity)))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
  #[serde(default = "default_active_only")]
  pub active_only: bool,
}

fn default_active_only() -> bool { true }

/// `GET /identities[?active_only=false]`
pub async fn list(
  State(state): State<AppState>,
  _caller: CurrentSession,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Identity>>, ApiError> {
  let identities = state.store.list_identities(params.active_only).await?;
  Ok(Json(identities))
}

/// `GET /identities/{id}`
pub async fn get_one(
  State(state): State<AppState>,
  _caller: CurrentSession,
  Path(id): Path<Uuid>,
) -> Result<Json<Identity>, ApiError> {
  let identity = state
    .store
    .get_identity(id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("identity {id} not found")))?;
  Ok(Json(identity))
}

/// `DELETE /identities/{id}` — an identity may only deactivate itself.
pub async fn delete(
  State(state): State<AppState>,
  caller: CurrentSession,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  if caller.identity.identity_id != id {
    return Err(ApiError::Forbidden);
  }
  state.store.deactivate_identity(id).await?;
  state.store.revoke_session(caller.session.session_id).await?;
  tracing::info!(identity_id = %id, "identity deactivated");
  Ok(StatusCode::NO_CONTENT)
}
