//! Error type for `domus-store-sqlite`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] domus_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored value failed to decode into its domain type.
  #[error("decode error: {0}")]
  Decode(String),

  #[error("identity not found: {0}")]
  IdentityNotFound(Uuid),

  #[error("group not found: {0}")]
  GroupNotFound(Uuid),

  #[error("session not found: {0}")]
  SessionNotFound(Uuid),

  /// No *active* membership exists for the pair.
  #[error("no active membership for identity {identity_id} in group {group_id}")]
  MembershipNotFound { identity_id: Uuid, group_id: Uuid },

  /// An active membership already exists for the pair.
  #[error("identity {identity_id} already has an active membership in group {group_id}")]
  DuplicateMembership { identity_id: Uuid, group_id: Uuid },

  /// An active identity already holds this tax ID.
  #[error("tax id already registered to an active identity")]
  DuplicateTaxId,

  /// An active group already uses this display name.
  #[error("group name already in use: {0:?}")]
  DuplicateGroupName(String),

  /// Deactivation refused while active memberships remain.
  #[error("group {group_id} still has {members} active membership(s)")]
  GroupNotEmpty { group_id: Uuid, members: u64 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
