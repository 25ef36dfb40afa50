//! Group — an organizational container (household, company, residence).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of organization a group represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
  Household,
  Company,
  Residence,
}

impl GroupKind {
  pub fn as_str(self) -> &'static str {
    match self {
      GroupKind::Household => "household",
      GroupKind::Company => "company",
      GroupKind::Residence => "residence",
    }
  }

  pub fn parse(s: &str) -> Option<GroupKind> {
    match s {
      "household" => Some(GroupKind::Household),
      "company" => Some(GroupKind::Company),
      "residence" => Some(GroupKind::Residence),
      _ => None,
    }
  }
}

/// An organizational container.
///
/// No two *active* groups share a display name; an inactive group's name is
/// free for reuse. A group can only be deactivated once it has zero active
/// memberships.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
  pub group_id:     Uuid,
  pub display_name: String,
  pub kind:         GroupKind,
  pub active:       bool,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

/// Input for creating a group.
#[derive(Debug, Clone)]
pub struct NewGroup {
  pub display_name: String,
  pub kind:         GroupKind,
}
