//! Session-context manager: which (group, role) pair a session operates
//! under.
//!
//! Context selection is *exact*: the identity must hold precisely the
//! requested role in the group, not merely a role that satisfies it in the
//! hierarchy. Authorization checks, by contrast, are hierarchical — see
//! [`crate::authz`].

use thiserror::Error;
use uuid::Uuid;

use crate::{
  membership::Role,
  session::{ActiveContext, Session},
  store::DirectoryStore,
};

/// Failure to select an active context.
#[derive(Debug, Error)]
pub enum ContextError<E: std::error::Error> {
  /// The session's identity has no active membership in the group with
  /// exactly the requested role.
  #[error("identity {identity_id} holds no active '{role}' membership in group {group_id}")]
  NotHeld {
    identity_id: Uuid,
    group_id:    Uuid,
    role:        Role,
  },

  #[error(transparent)]
  Store(#[from] E),
}

/// The contexts available to an identity: its active memberships as
/// (group, role) pairs, in membership insertion order.
pub async fn list_contexts<S: DirectoryStore>(
  store: &S,
  identity_id: Uuid,
) -> Result<Vec<ActiveContext>, S::Error> {
  let memberships = store.memberships_for_identity(identity_id).await?;
  Ok(
    memberships
      .into_iter()
      .map(|m| ActiveContext { group_id: m.group_id, role: m.role })
      .collect(),
  )
}

/// Make (`group_id`, `role`) the session's active context.
///
/// Validates that the session's identity currently holds an active
/// membership in `group_id` with exactly `role`; a higher role does not
/// qualify. On success the stored context is overwritten atomically — no
/// history of prior contexts is kept.
pub async fn set_active_context<S: DirectoryStore>(
  store: &S,
  session: &Session,
  group_id: Uuid,
  role: Role,
) -> Result<ActiveContext, ContextError<S::Error>> {
  let held = store.active_role(session.identity_id, group_id).await?;

  match held {
    Some(raw) if Role::parse(&raw) == Some(role) => {
      store
        .set_session_context(session.session_id, group_id, role)
        .await?;
      Ok(ActiveContext { group_id, role })
    }
    _ => Err(ContextError::NotHeld {
      identity_id: session.identity_id,
      group_id,
      role,
    }),
  }
}

/// The session's stored active context, if any.
///
/// This is a pure read of the session row — the membership behind the
/// context is *not* re-validated, so a membership deactivated after
/// selection leaves a stale pair here until the next selection. Callers
/// making authorization decisions must go through
/// [`crate::authz::has_role_in_active_context`], which re-checks live state
/// and denies on staleness.
pub fn get_active_context(session: &Session) -> Option<ActiveContext> {
  session.active_context
}
