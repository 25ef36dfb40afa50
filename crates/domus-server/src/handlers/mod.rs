//! HTTP handlers, grouped by resource.

pub mod groups;
pub mod identities;
pub mod members;
pub mod sessions;

use domus_core::{authz, membership::Role};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// Gate an operation on the caller holding `required` (or higher) in the
/// group. Denial carries no reason detail.
pub(crate) async fn require_role(
  state: &AppState,
  identity_id: Uuid,
  group_id: Uuid,
  required: Role,
) -> Result<(), ApiError> {
  if authz::has_role(&state.store, identity_id, group_id, required).await? {
    Ok(())
  } else {
    Err(ApiError::Forbidden)
  }
}
