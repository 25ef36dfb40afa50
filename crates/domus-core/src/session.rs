//! Session — one authenticated login and its single active context.
//!
//! A session stores only the SHA-256 digest of its bearer token; the token
//! itself is shown to the client once at login. The active context is the
//! (group, role) pair the session currently operates under, chosen from the
//! identity's memberships via [`crate::context::set_active_context`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::membership::Role;

/// The (group, role) pair a session currently operates under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveContext {
  pub group_id: Uuid,
  pub role:     Role,
}

/// One authenticated login.
///
/// Multiple concurrent sessions per identity are permitted and independent;
/// each tracks its own active context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
  pub session_id:   Uuid,
  pub identity_id:  Uuid,
  /// Hex SHA-256 of the bearer token. Never serialized outward.
  #[serde(skip_serializing, default)]
  pub token_digest: String,
  pub created_at:   DateTime<Utc>,
  pub expires_at:   DateTime<Utc>,
  pub revoked:      bool,
  /// Empty at login; set only through successful context selection; emptied
  /// only by logout or expiry.
  pub active_context: Option<ActiveContext>,
}

impl Session {
  /// Whether the session is still usable at `now`.
  pub fn is_open(&self, now: DateTime<Utc>) -> bool {
    !self.revoked && self.expires_at > now
  }
}

/// Input for creating a session at login.
#[derive(Debug, Clone)]
pub struct NewSession {
  pub identity_id:  Uuid,
  pub token_digest: String,
  pub expires_at:   DateTime<Utc>,
}
