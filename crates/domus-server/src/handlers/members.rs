//! Handlers for `/groups/{id}/members` endpoints.
//!
//! Listing requires membership in the group; every mutation requires admin.
//!
//! | Method   | Path                                | Notes |
//! |----------|-------------------------------------|-------|
//! | `GET`    | `/groups/{id}/members`              | `?role=`, `?active=` filters |
//! | `POST`   | `/groups/{id}/members`              | Body: `{"identity_id":…, "role":…}` |
//! | `PUT`    | `/groups/{id}/members/{identity_id}`| Body: `{"role":…}` |
//! | `DELETE` | `/groups/{id}/members/{identity_id}`| Soft removal |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use domus_core::{
  membership::{Membership, MembershipFilter, Role},
  store::DirectoryStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, auth::CurrentSession, error::ApiError, handlers::require_role};

fn parse_role(raw: &str) -> Result<Role, ApiError> {
  raw
    .parse()
    .map_err(|e: domus_core::Error| ApiError::BadRequest(e.to_string()))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub role:   Option<String>,
  pub active: Option<bool>,
}

/// `GET /groups/{id}/members`
pub async fn list(
  State(state): State<AppState>,
  caller: CurrentSession,
  Path(group_id): Path<Uuid>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Membership>>, ApiError> {
  require_role(&state, caller.identity.identity_id, group_id, Role::Member)
    .await?;

  let role = params.role.as_deref().map(parse_role).transpose()?;
  let members = state
    .store
    .memberships_for_group(group_id, MembershipFilter { role, active: params.active })
    .await?;
  Ok(Json(members))
}

#[derive(Debug, Deserialize)]
pub struct AddBody {
  pub identity_id: Uuid,
  pub role:        String,
}

/// `POST /groups/{id}/members`
pub async fn add(
  State(state): State<AppState>,
  caller: CurrentSession,
  Path(group_id): Path<Uuid>,
  Json(body): Json<AddBody>,
) -> Result<impl IntoResponse, ApiError> {
  require_role(&state, caller.identity.identity_id, group_id, Role::Admin)
    .await?;
  let role = parse_role(&body.role)?;

  let membership = state
    .store
    .add_or_reactivate_membership(body.identity_id, group_id, role)
    .await?;
  tracing::info!(
    group_id = %group_id,
    identity_id = %body.identity_id,
    role = %membership.role,
    "member added"
  );
  Ok((StatusCode::CREATED, Json(membership)))
}

#[derive(Debug, Deserialize)]
pub struct ChangeRoleBody {
  pub role: String,
}

/// `PUT /groups/{id}/members/{identity_id}`
pub async fn change_role(
  State(state): State<AppState>,
  caller: CurrentSession,
  Path((group_id, identity_id)): Path<(Uuid, Uuid)>,
  Json(body): Json<ChangeRoleBody>,
) -> Result<Json<Membership>, ApiError> {
  require_role(&state, caller.identity.identity_id, group_id, Role::Admin)
    .await?;
  let role = parse_role(&body.role)?;

  let membership = state
    .store
    .change_membership_role(identity_id, group_id, role)
    .await?;
  Ok(Json(membership))
}

/// `DELETE /groups/{id}/members/{identity_id}`
pub async fn remove(
  State(state): State<AppState>,
  caller: CurrentSession,
  Path((group_id, identity_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
  require_role(&state, caller.identity.identity_id, group_id, Role::Admin)
    .await?;
  state
    .store
    .deactivate_membership(identity_id, group_id)
    .await?;
  tracing::info!(group_id = %group_id, identity_id = %identity_id, "member removed");
  Ok(StatusCode::NO_CONTENT)
}
