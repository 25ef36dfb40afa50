//! Handlers for `/groups` endpoints.
//!
//! | Method   | Path           | Notes |
//! |----------|----------------|-------|
//! | `POST`   | `/groups`      | Creator becomes the group's first admin |
//! | `GET`    | `/groups`      | Optional `?active_only=false` |
//! | `GET`    | `/groups/{id}` | 404 if not found |
//! | `DELETE` | `/groups/{id}` | 409 while members remain |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use domus_core::{
  group::{Group, GroupKind, NewGroup},
  membership::Role,
  store::DirectoryStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, auth::CurrentSession, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub display_name: String,
  pub kind:         GroupKind,
}

/// `POST /groups`
///
/// Creates the group and immediately grants the caller an admin membership
/// in it, so every group has an administrator from birth.
pub async fn create(
  State(state): State<AppState>,
  caller: CurrentSession,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let group = state
    .store
    .add_group(NewGroup { display_name: body.display_name, kind: body.kind })
    .await?;
  state
    .store
    .add_or_reactivate_membership(
      caller.identity.identity_id,
      group.group_id,
      Role::Admin,
    )
    .await?;

  tracing::info!(group_id = %group.group_id, creator = %caller.identity.identity_id, "group created");
  Ok((StatusCode::CREATED, Json(group)))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
  #[serde(default = "default_active_only")]
  pub active_only: bool,
}

fn default_active_only() -> bool { true }

/// `GET /groups[?active_only=false]`
pub async fn list(
  State(state): State<AppState>,
  _caller: CurrentSession,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Group>>, ApiError> {
  let groups = state.store.list_groups(params.active_only).await?;
  Ok(Json(groups))
}

/// `GET /groups/{id}`
pub async fn get_one(
  State(state): State<AppState>,
  _caller: CurrentSession,
  Path(id): Path<Uuid>,
) -> Result<Json<Group>, ApiError> {
  let group = state
    .store
    .get_group(id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("group {id} not found")))?;
  Ok(Json(group))
}

/// `DELETE /groups/{id}`
///
/// Refused with 409 while any active membership remains. No role gate: an
/// empty group has no members left to hold one, and emptying it in the
/// first place already required an admin for every removal.
pub async fn delete(
  State(state): State<AppState>,
  _caller: CurrentSession,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  state.store.deactivate_group(id).await?;
  tracing::info!(group_id = %id, "group deactivated");
  Ok(StatusCode::NO_CONTENT)
}
