//! Authorization engine: yes/no decisions against a required role.
//!
//! Decisions are booleans, never errors. A missing membership, an inactive
//! group and an insufficient role are all plain `false`, so callers cannot
//! learn whether a group exists from a denial. Store failures propagate
//! unmodified.

use uuid::Uuid;

use crate::{
  membership::{Role, role_level},
  session::Session,
  store::DirectoryStore,
};

/// Does `identity_id` hold at least `required` in `group_id`?
///
/// Consults the identity's active membership; no membership means `false`.
/// The stored role string is compared by level, so an unrecognized role
/// from a corrupt row fails closed rather than erroring.
pub async fn has_role<S: DirectoryStore>(
  store: &S,
  identity_id: Uuid,
  group_id: Uuid,
  required: Role,
) -> Result<bool, S::Error> {
  let held = store.active_role(identity_id, group_id).await?;
  Ok(match held {
    Some(raw) => role_level(&raw) >= required.level(),
    None => false,
  })
}

/// [`has_role`] against the session's active context.
///
/// The fallback path for callers that omit an explicit group. Membership is
/// re-checked live, so a context that went stale after selection (its
/// membership deactivated) still denies correctly. A session with no active
/// context denies.
pub async fn has_role_in_active_context<S: DirectoryStore>(
  store: &S,
  session: &Session,
  required: Role,
) -> Result<bool, S::Error> {
  match &session.active_context {
    Some(ctx) => has_role(store, session.identity_id, ctx.group_id, required).await,
    None => Ok(false),
  }
}
