//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings; UUIDs as hyphenated
//! lowercase strings; roles and group kinds as their lowercase names.

use chrono::{DateTime, Utc};
use domus_core::{
  group::{Group, GroupKind},
  identity::Identity,
  membership::{Membership, Role},
  session::{ActiveContext, Session},
};
use domus_cpf::Cpf;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Role / GroupKind ────────────────────────────────────────────────────────

pub fn decode_role(s: &str) -> Result<Role> {
  Role::parse(s).ok_or_else(|| Error::Core(domus_core::Error::UnknownRole(s.to_string())))
}

pub fn decode_group_kind(s: &str) -> Result<GroupKind> {
  GroupKind::parse(s)
    .ok_or_else(|| Error::Decode(format!("unknown group kind: {s:?}")))
}

// ─── Raw row structs ─────────────────────────────────────────────────────────

pub struct RawIdentity {
  pub identity_id:   String,
  pub tax_id:        String,
  pub display_name:  String,
  pub password_hash: String,
  pub active:        bool,
  pub created_at:    String,
  pub updated_at:    String,
  pub last_login:    Option<String>,
}

impl RawIdentity {
  pub fn into_identity(self) -> Result<Identity> {
    Ok(Identity {
      identity_id: decode_uuid(&self.identity_id)?,
      tax_id: Cpf::parse(&self.tax_id).map_err(domus_core::Error::from)?,
      display_name: self.display_name,
      password_hash: self.password_hash,
      active: self.active,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
      last_login: self.last_login.as_deref().map(decode_dt).transpose()?,
    })
  }
}

pub struct RawGroup {
  pub group_id:     String,
  pub display_name: String,
  pub kind:         String,
  pub active:       bool,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawGroup {
  pub fn into_group(self) -> Result<Group> {
    Ok(Group {
      group_id: decode_uuid(&self.group_id)?,
      display_name: self.display_name,
      kind: decode_group_kind(&self.kind)?,
      active: self.active,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

pub struct RawMembership {
  pub membership_id: String,
  pub identity_id:   String,
  pub group_id:      String,
  pub role:          String,
  pub active:        bool,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawMembership {
  pub fn into_membership(self) -> Result<Membership> {
    Ok(Membership {
      membership_id: decode_uuid(&self.membership_id)?,
      identity_id: decode_uuid(&self.identity_id)?,
      group_id: decode_uuid(&self.group_id)?,
      role: decode_role(&self.role)?,
      active: self.active,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

pub struct RawSession {
  pub session_id:       String,
  pub identity_id:      String,
  pub token_digest:     String,
  pub created_at:       String,
  pub expires_at:       String,
  pub revoked:          bool,
  pub context_group_id: Option<String>,
  pub context_role:     Option<String>,
}

impl RawSession {
  pub fn into_session(self) -> Result<Session> {
    // Both context columns set, or both NULL; anything else is a torn row.
    let active_context = match (self.context_group_id, self.context_role) {
      (Some(group), Some(role)) => Some(ActiveContext {
        group_id: decode_uuid(&group)?,
        role:     decode_role(&role)?,
      }),
      (None, None) => None,
      _ => {
        return Err(Error::Decode(
          "session context columns half-populated".to_string(),
        ));
      }
    };

    Ok(Session {
      session_id: decode_uuid(&self.session_id)?,
      identity_id: decode_uuid(&self.identity_id)?,
      token_digest: self.token_digest,
      created_at: decode_dt(&self.created_at)?,
      expires_at: decode_dt(&self.expires_at)?,
      revoked: self.revoked,
      active_context,
    })
  }
}
