//! Identity — a person known to the platform.
//!
//! The tax identifier is validated on entry ([`domus_cpf::Cpf`] cannot hold
//! an invalid value) and stored unmasked. Identities are never hard-deleted;
//! disabling an account clears the `active` flag.

use chrono::{DateTime, Utc};
use domus_cpf::Cpf;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A person record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
  pub identity_id:  Uuid,
  /// Canonical unmasked CPF; unique among active identities.
  pub tax_id:       Cpf,
  pub display_name: String,
  /// Argon2 PHC string. Never serialized outward.
  #[serde(skip_serializing, default)]
  pub password_hash: String,
  pub active:       bool,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
  pub last_login:   Option<DateTime<Utc>>,
}

/// Input for provisioning a new identity. IDs and timestamps are assigned
/// by the store.
#[derive(Debug, Clone)]
pub struct NewIdentity {
  pub tax_id:        Cpf,
  pub display_name:  String,
  pub password_hash: String,
}
