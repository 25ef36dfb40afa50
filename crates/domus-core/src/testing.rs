//! In-memory [`DirectoryStore`] used by the engine unit tests.
//!
//! Implements only what `authz` and `context` consume; everything else is
//! `unimplemented!()`. Roles are stored as raw strings so tests can inject
//! values outside the closed set.

use std::{
  collections::HashMap,
  sync::Mutex,
};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  group::{Group, NewGroup},
  identity::{Identity, NewIdentity},
  membership::{Membership, MembershipFilter, Role},
  session::{ActiveContext, NewSession, Session},
  store::DirectoryStore,
};

#[derive(Default)]
pub struct MemStore {
  /// (identity, group, raw role, active) in insertion order.
  grants:   Mutex<Vec<(Uuid, Uuid, String, bool)>>,
  sessions: Mutex<HashMap<Uuid, Session>>,
}

impl MemStore {
  /// Grant `role` (raw string, may be outside the closed set) to the pair,
  /// inserting or reactivating in place.
  pub fn grant(&self, identity_id: Uuid, group_id: Uuid, role: &str) {
    let mut grants = self.grants.lock().unwrap();
    for entry in grants.iter_mut() {
      if entry.0 == identity_id && entry.1 == group_id {
        entry.2 = role.to_string();
        entry.3 = true;
        return;
      }
    }
    grants.push((identity_id, group_id, role.to_string(), true));
  }

  pub fn revoke_grant(&self, identity_id: Uuid, group_id: Uuid) {
    let mut grants = self.grants.lock().unwrap();
    for entry in grants.iter_mut() {
      if entry.0 == identity_id && entry.1 == group_id {
        entry.3 = false;
      }
    }
  }

  pub fn insert_session(&self, session: Session) {
    self
      .sessions
      .lock()
      .unwrap()
      .insert(session.session_id, session);
  }

  pub fn stored_context(&self, session_id: Uuid) -> Option<ActiveContext> {
    self
      .sessions
      .lock()
      .unwrap()
      .get(&session_id)
      .and_then(|s| s.active_context)
  }
}

pub fn session_for(identity_id: Uuid, expires_at: DateTime<Utc>) -> Session {
  Session {
    session_id: Uuid::new_v4(),
    identity_id,
    token_digest: String::new(),
    created_at: Utc::now(),
    expires_at,
    revoked: false,
    active_context: None,
  }
}

impl DirectoryStore for MemStore {
  type Error = std::convert::Infallible;

  async fn add_identity(&self, _: NewIdentity) -> Result<Identity, Self::Error> {
    unimplemented!()
  }

  async fn get_identity(&self, _: Uuid) -> Result<Option<Identity>, Self::Error> {
    unimplemented!()
  }

  async fn find_identity_by_tax_id(
    &self,
    _: &domus_cpf::Cpf,
  ) -> Result<Option<Identity>, Self::Error> {
    unimplemented!()
  }

  async fn list_identities(&self, _: bool) -> Result<Vec<Identity>, Self::Error> {
    unimplemented!()
  }

  async fn deactivate_identity(&self, _: Uuid) -> Result<(), Self::Error> {
    unimplemented!()
  }

  async fn touch_login(&self, _: Uuid) -> Result<(), Self::Error> {
    unimplemented!()
  }

  async fn add_group(&self, _: NewGroup) -> Result<Group, Self::Error> {
    unimplemented!()
  }

  async fn get_group(&self, _: Uuid) -> Result<Option<Group>, Self::Error> {
    unimplemented!()
  }

  async fn list_groups(&self, _: bool) -> Result<Vec<Group>, Self::Error> {
    unimplemented!()
  }

  async fn deactivate_group(&self, _: Uuid) -> Result<(), Self::Error> {
    unimplemented!()
  }

  async fn add_or_reactivate_membership(
    &self,
    _: Uuid,
    _: Uuid,
    _: Role,
  ) -> Result<Membership, Self::Error> {
    unimplemented!()
  }

  async fn deactivate_membership(&self, _: Uuid, _: Uuid) -> Result<(), Self::Error> {
    unimplemented!()
  }

  async fn change_membership_role(
    &self,
    _: Uuid,
    _: Uuid,
    _: Role,
  ) -> Result<Membership, Self::Error> {
    unimplemented!()
  }

  async fn memberships_for_identity(
    &self,
    identity_id: Uuid,
  ) -> Result<Vec<Membership>, Self::Error> {
    let now = Utc::now();
    Ok(
      self
        .grants
        .lock()
        .unwrap()
        .iter()
        .filter(|(i, _, _, active)| *i == identity_id && *active)
        .map(|(i, g, role, _)| Membership {
          membership_id: Uuid::new_v4(),
          identity_id:   *i,
          group_id:      *g,
          role:          Role::parse(role).expect("test grant with valid role"),
          active:        true,
          created_at:    now,
          updated_at:    now,
        })
        .collect(),
    )
  }

  async fn memberships_for_group(
    &self,
    _: Uuid,
    _: MembershipFilter,
  ) -> Result<Vec<Membership>, Self::Error> {
    unimplemented!()
  }

  async fn count_active_memberships(&self, _: Uuid) -> Result<u64, Self::Error> {
    unimplemented!()
  }

  async fn active_role(
    &self,
    identity_id: Uuid,
    group_id: Uuid,
  ) -> Result<Option<String>, Self::Error> {
    Ok(
      self
        .grants
        .lock()
        .unwrap()
        .iter()
        .find(|(i, g, _, active)| *i == identity_id && *g == group_id && *active)
        .map(|(_, _, role, _)| role.clone()),
    )
  }

  async fn create_session(&self, _: NewSession) -> Result<Session, Self::Error> {
    unimplemented!()
  }

  async fn find_session_by_token_digest(
    &self,
    _: &str,
  ) -> Result<Option<Session>, Self::Error> {
    unimplemented!()
  }

  async fn set_session_context(
    &self,
    session_id: Uuid,
    group_id: Uuid,
    role: Role,
  ) -> Result<(), Self::Error> {
    if let Some(session) = self.sessions.lock().unwrap().get_mut(&session_id) {
      session.active_context = Some(ActiveContext { group_id, role });
    }
    Ok(())
  }

  async fn revoke_session(&self, _: Uuid) -> Result<(), Self::Error> {
    unimplemented!()
  }
}
