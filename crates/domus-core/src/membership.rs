//! Membership — the relationship granting an identity a role within a group.
//!
//! Roles form a total order encoded as integer levels, not a type hierarchy.
//! Comparison always goes through [`Role::level`] / [`role_level`] so that a
//! role string from a corrupt row ranks below every real role and fails
//! authorization closed.

use chrono::{DateTime, Utc};
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

// ─── Role hierarchy ──────────────────────────────────────────────────────────

/// The closed set of roles, ordered `member < moderator < admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Member,
  Moderator,
  Admin,
}

impl Role {
  /// Privilege level; higher satisfies lower.
  pub const fn level(self) -> u8 {
    match self {
      Role::Member => 1,
      Role::Moderator => 2,
      Role::Admin => 3,
    }
  }

  pub const fn as_str(self) -> &'static str {
    match self {
      Role::Member => "member",
      Role::Moderator => "moderator",
      Role::Admin => "admin",
    }
  }

  /// Lenient lookup; `None` for anything outside the closed set.
  pub fn parse(s: &str) -> Option<Role> {
    match s {
      "member" => Some(Role::Member),
      "moderator" => Some(Role::Moderator),
      "admin" => Some(Role::Admin),
      _ => None,
    }
  }

  /// Whether this role meets or exceeds `required` in the hierarchy.
  pub fn satisfies(self, required: Role) -> bool {
    self.level() >= required.level()
  }
}

impl FromStr for Role {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Role::parse(s).ok_or_else(|| Error::UnknownRole(s.to_string()))
  }
}

impl core::fmt::Display for Role {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Privilege level of a raw role string as stored.
///
/// Unrecognized strings map to 0, below every real role, so malformed data
/// can never satisfy an authorization check.
pub fn role_level(raw: &str) -> u8 {
  Role::parse(raw).map_or(0, Role::level)
}

// ─── Membership record ───────────────────────────────────────────────────────

/// One identity's role in one group, with soft activation.
///
/// At most one row exists per (identity, group) pair, active or not; removal
/// clears the `active` flag and re-adding reactivates the same row, keeping
/// the audit history to a single line per pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
  pub membership_id: Uuid,
  pub identity_id:   Uuid,
  pub group_id:      Uuid,
  pub role:          Role,
  pub active:        bool,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

/// Filters for [`DirectoryStore::memberships_for_group`].
///
/// [`DirectoryStore::memberships_for_group`]: crate::store::DirectoryStore::memberships_for_group
#[derive(Debug, Clone, Copy, Default)]
pub struct MembershipFilter {
  pub role:   Option<Role>,
  pub active: Option<bool>,
}
