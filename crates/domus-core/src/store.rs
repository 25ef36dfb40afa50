//! The `DirectoryStore` trait — the persistence collaborator contract.
//!
//! Implemented by storage backends (e.g. `domus-store-sqlite`). The
//! authorization engine and session-context manager depend on this
//! abstraction, never on a concrete backend.
//!
//! Write operations use soft activation throughout: nothing is ever
//! physically deleted. `add_or_reactivate_membership`,
//! `deactivate_membership`, `change_membership_role` and `deactivate_group`
//! are read-then-write sequences and MUST be executed atomically by the
//! backend (a transaction or equivalent), or two concurrent adds for the
//! same (identity, group) pair can both observe "no active row".
//!
//! All methods return `Send` futures so the trait can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use uuid::Uuid;

use crate::{
  group::{Group, NewGroup},
  identity::{Identity, NewIdentity},
  membership::{Membership, MembershipFilter, Role},
  session::{NewSession, Session},
};

/// Abstraction over a Domus directory backend.
pub trait DirectoryStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Identities ────────────────────────────────────────────────────────

  /// Provision a new identity. Fails if an *active* identity already holds
  /// the same tax ID.
  fn add_identity(
    &self,
    input: NewIdentity,
  ) -> impl Future<Output = Result<Identity, Self::Error>> + Send + '_;

  /// Retrieve an identity by UUID. Returns `None` if not found.
  fn get_identity(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send + '_;

  /// Look up the *active* identity holding `tax_id`, if any.
  fn find_identity_by_tax_id<'a>(
    &'a self,
    tax_id: &'a domus_cpf::Cpf,
  ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send + 'a;

  /// List identities, optionally restricted to active ones.
  fn list_identities(
    &self,
    active_only: bool,
  ) -> impl Future<Output = Result<Vec<Identity>, Self::Error>> + Send + '_;

  /// Soft-disable an account. Fails if no active identity has this ID.
  fn deactivate_identity(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Record a successful login time for an identity.
  fn touch_login(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Groups ────────────────────────────────────────────────────────────

  /// Create a group. Fails if an *active* group already uses the name.
  fn add_group(
    &self,
    input: NewGroup,
  ) -> impl Future<Output = Result<Group, Self::Error>> + Send + '_;

  fn get_group(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Group>, Self::Error>> + Send + '_;

  fn list_groups(
    &self,
    active_only: bool,
  ) -> impl Future<Output = Result<Vec<Group>, Self::Error>> + Send + '_;

  /// Soft-disable a group. Fails while the group still has active
  /// memberships, or if no active group has this ID.
  fn deactivate_group(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Memberships ───────────────────────────────────────────────────────

  /// Grant `role` to `identity_id` in `group_id`.
  ///
  /// - an active row for the pair already exists ⇒ duplicate error;
  /// - an inactive row exists ⇒ it is reactivated in place with `role`
  ///   (no second row is ever inserted for a pair);
  /// - otherwise a new active row is inserted.
  fn add_or_reactivate_membership(
    &self,
    identity_id: Uuid,
    group_id: Uuid,
    role: Role,
  ) -> impl Future<Output = Result<Membership, Self::Error>> + Send + '_;

  /// Soft-remove the active membership for the pair. Fails if none exists.
  fn deactivate_membership(
    &self,
    identity_id: Uuid,
    group_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Update the role of the active membership in place. Fails if none
  /// exists.
  fn change_membership_role(
    &self,
    identity_id: Uuid,
    group_id: Uuid,
    role: Role,
  ) -> impl Future<Output = Result<Membership, Self::Error>> + Send + '_;

  /// All currently active memberships of an identity, in insertion order.
  fn memberships_for_identity(
    &self,
    identity_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Membership>, Self::Error>> + Send + '_;

  /// Memberships of a group, optionally filtered by role and active flag.
  fn memberships_for_group(
    &self,
    group_id: Uuid,
    filter: MembershipFilter,
  ) -> impl Future<Output = Result<Vec<Membership>, Self::Error>> + Send + '_;

  /// Number of active memberships in a group; gates group deactivation.
  fn count_active_memberships(
    &self,
    group_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Raw role string of the identity's active membership in the group.
  ///
  /// Returned verbatim from storage: the authorization layer maps unknown
  /// names to the lowest level so a corrupt row fails closed instead of
  /// erroring.
  fn active_role(
    &self,
    identity_id: Uuid,
    group_id: Uuid,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + '_;

  // ── Sessions ──────────────────────────────────────────────────────────

  /// Persist a new session. The active context starts empty.
  fn create_session(
    &self,
    input: NewSession,
  ) -> impl Future<Output = Result<Session, Self::Error>> + Send + '_;

  /// Resolve a bearer-token digest to its session, if one exists.
  /// Expiry and revocation checks are the caller's concern.
  fn find_session_by_token_digest<'a>(
    &'a self,
    digest: &'a str,
  ) -> impl Future<Output = Result<Option<Session>, Self::Error>> + Send + 'a;

  /// Overwrite the session's active context. Scoped to a single session
  /// row; needs no global serialization. Fails if the session is unknown.
  fn set_session_context(
    &self,
    session_id: Uuid,
    group_id: Uuid,
    role: Role,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Mark a session revoked (logout). Fails if the session is unknown.
  fn revoke_session(
    &self,
    session_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
