//! [`SqliteStore`] — the SQLite implementation of [`DirectoryStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use domus_core::{
  group::{Group, NewGroup},
  identity::{Identity, NewIdentity},
  membership::{Membership, MembershipFilter, Role},
  session::{NewSession, Session},
  store::DirectoryStore,
};

use crate::{
  Error, Result,
  encode::{
    RawGroup, RawIdentity, RawMembership, RawSession, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Row mapping helpers ─────────────────────────────────────────────────────

const IDENTITY_COLS: &str =
  "identity_id, tax_id, display_name, password_hash, active, created_at, updated_at, last_login";

fn identity_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawIdentity> {
  Ok(RawIdentity {
    identity_id:   row.get(0)?,
    tax_id:        row.get(1)?,
    display_name:  row.get(2)?,
    password_hash: row.get(3)?,
    active:        row.get(4)?,
    created_at:    row.get(5)?,
    updated_at:    row.get(6)?,
    last_login:    row.get(7)?,
  })
}

const GROUP_COLS: &str =
  "group_id, display_name, kind, active, created_at, updated_at";

fn group_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawGroup> {
  Ok(RawGroup {
    group_id:     row.get(0)?,
    display_name: row.get(1)?,
    kind:         row.get(2)?,
    active:       row.get(3)?,
    created_at:   row.get(4)?,
    updated_at:   row.get(5)?,
  })
}

const MEMBERSHIP_COLS: &str =
  "membership_id, identity_id, group_id, role, active, created_at, updated_at";

fn membership_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawMembership> {
  Ok(RawMembership {
    membership_id: row.get(0)?,
    identity_id:   row.get(1)?,
    group_id:      row.get(2)?,
    role:          row.get(3)?,
    active:        row.get(4)?,
    created_at:    row.get(5)?,
    updated_at:    row.get(6)?,
  })
}

const SESSION_COLS: &str =
  "session_id, identity_id, token_digest, created_at, expires_at, revoked, \
   context_group_id, context_role";

fn session_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawSession> {
  Ok(RawSession {
    session_id:       row.get(0)?,
    identity_id:      row.get(1)?,
    token_digest:     row.get(2)?,
    created_at:       row.get(3)?,
    expires_at:       row.get(4)?,
    revoked:          row.get(5)?,
    context_group_id: row.get(6)?,
    context_role:     row.get(7)?,
  })
}

// ─── Transaction outcomes ────────────────────────────────────────────────────
//
// Domain conditions detected inside a `conn.call` closure are reported
// through these enums and mapped to [`Error`] outside, so the closures stay
// rusqlite-only.

enum UpsertOutcome {
  Done(RawMembership),
  ActiveExists,
  MissingIdentity,
  MissingGroup,
}

enum DeactivateGroupOutcome {
  Done,
  Missing,
  NotEmpty(u64),
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Domus directory backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All writes
/// funnel through one connection, and the compound membership operations run
/// in transactions, so two concurrent adds for the same (identity, group)
/// pair cannot both insert an active row.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── DirectoryStore impl ─────────────────────────────────────────────────────

impl DirectoryStore for SqliteStore {
  type Error = Error;

  // ── Identities ────────────────────────────────────────────────────────────

  async fn add_identity(&self, input: NewIdentity) -> Result<Identity> {
    let now = Utc::now();
    let identity = Identity {
      identity_id: Uuid::new_v4(),
      tax_id: input.tax_id,
      display_name: input.display_name,
      password_hash: input.password_hash,
      active: true,
      created_at: now,
      updated_at: now,
      last_login: None,
    };

    let id_str     = encode_uuid(identity.identity_id);
    let tax_id_str = identity.tax_id.as_digits().to_owned();
    let name       = identity.display_name.clone();
    let hash       = identity.password_hash.clone();
    let at_str     = encode_dt(now);

    let inserted: bool = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let taken: bool = tx
          .query_row(
            "SELECT 1 FROM identities WHERE tax_id = ?1 AND active = 1",
            rusqlite::params![tax_id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if taken {
          return Ok(false);
        }

        tx.execute(
          "INSERT INTO identities
             (identity_id, tax_id, display_name, password_hash, active, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)",
          rusqlite::params![id_str, tax_id_str, name, hash, at_str],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if inserted { Ok(identity) } else { Err(Error::DuplicateTaxId) }
  }

  async fn get_identity(&self, id: Uuid) -> Result<Option<Identity>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawIdentity> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {IDENTITY_COLS} FROM identities WHERE identity_id = ?1"),
              rusqlite::params![id_str],
              identity_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawIdentity::into_identity).transpose()
  }

  async fn find_identity_by_tax_id(&self, tax_id: &domus_cpf::Cpf) -> Result<Option<Identity>> {
    let tax_id_str = tax_id.as_digits().to_owned();

    let raw: Option<RawIdentity> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {IDENTITY_COLS} FROM identities WHERE tax_id = ?1 AND active = 1"
              ),
              rusqlite::params![tax_id_str],
              identity_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawIdentity::into_identity).transpose()
  }

  async fn list_identities(&self, active_only: bool) -> Result<Vec<Identity>> {
    let raws: Vec<RawIdentity> = self
      .conn
      .call(move |conn| {
        let sql = if active_only {
          format!("SELECT {IDENTITY_COLS} FROM identities WHERE active = 1 ORDER BY rowid")
        } else {
          format!("SELECT {IDENTITY_COLS} FROM identities ORDER BY rowid")
        };
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], identity_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawIdentity::into_identity).collect()
  }

  async fn deactivate_identity(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(Utc::now());

    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE identities SET active = 0, updated_at = ?1
           WHERE identity_id = ?2 AND active = 1",
          rusqlite::params![at_str, id_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::IdentityNotFound(id));
    }
    Ok(())
  }

  async fn touch_login(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(Utc::now());

    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE identities SET last_login = ?1 WHERE identity_id = ?2",
          rusqlite::params![at_str, id_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::IdentityNotFound(id));
    }
    Ok(())
  }

  // ── Groups ────────────────────────────────────────────────────────────────

  async fn add_group(&self, input: NewGroup) -> Result<Group> {
    let now = Utc::now();
    let group = Group {
      group_id: Uuid::new_v4(),
      display_name: input.display_name,
      kind: input.kind,
      active: true,
      created_at: now,
      updated_at: now,
    };

    let id_str   = encode_uuid(group.group_id);
    let name     = group.display_name.clone();
    let kind_str = group.kind.as_str().to_owned();
    let at_str   = encode_dt(now);

    let inserted: bool = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let taken: bool = tx
          .query_row(
            "SELECT 1 FROM groups WHERE display_name = ?1 AND active = 1",
            rusqlite::params![name],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if taken {
          return Ok(false);
        }

        tx.execute(
          "INSERT INTO groups (group_id, display_name, kind, active, created_at, updated_at)
           VALUES (?1, ?2, ?3, 1, ?4, ?4)",
          rusqlite::params![id_str, name, kind_str, at_str],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if inserted {
      Ok(group)
    } else {
      Err(Error::DuplicateGroupName(group.display_name))
    }
  }

  async fn get_group(&self, id: Uuid) -> Result<Option<Group>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawGroup> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {GROUP_COLS} FROM groups WHERE group_id = ?1"),
              rusqlite::params![id_str],
              group_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawGroup::into_group).transpose()
  }

  async fn list_groups(&self, active_only: bool) -> Result<Vec<Group>> {
    let raws: Vec<RawGroup> = self
      .conn
      .call(move |conn| {
        let sql = if active_only {
          format!("SELECT {GROUP_COLS} FROM groups WHERE active = 1 ORDER BY rowid")
        } else {
          format!("SELECT {GROUP_COLS} FROM groups ORDER BY rowid")
        };
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], group_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawGroup::into_group).collect()
  }

  async fn deactivate_group(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(Utc::now());

    let outcome: DeactivateGroupOutcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let exists: bool = tx
          .query_row(
            "SELECT 1 FROM groups WHERE group_id = ?1 AND active = 1",
            rusqlite::params![id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !exists {
          return Ok(DeactivateGroupOutcome::Missing);
        }

        let members: u64 = tx.query_row(
          "SELECT COUNT(*) FROM memberships WHERE group_id = ?1 AND active = 1",
          rusqlite::params![id_str],
          |r| r.get(0),
        )?;
        if members > 0 {
          return Ok(DeactivateGroupOutcome::NotEmpty(members));
        }

        tx.execute(
          "UPDATE groups SET active = 0, updated_at = ?1 WHERE group_id = ?2",
          rusqlite::params![at_str, id_str],
        )?;
        tx.commit()?;
        Ok(DeactivateGroupOutcome::Done)
      })
      .await?;

    match outcome {
      DeactivateGroupOutcome::Done => Ok(()),
      DeactivateGroupOutcome::Missing => Err(Error::GroupNotFound(id)),
      DeactivateGroupOutcome::NotEmpty(members) => {
        Err(Error::GroupNotEmpty { group_id: id, members })
      }
    }
  }

  // ── Memberships ───────────────────────────────────────────────────────────

  async fn add_or_reactivate_membership(
    &self,
    identity_id: Uuid,
    group_id: Uuid,
    role: Role,
  ) -> Result<Membership> {
    let identity_str = encode_uuid(identity_id);
    let group_str    = encode_uuid(group_id);
    let role_str     = role.as_str().to_owned();
    let new_id_str   = encode_uuid(Uuid::new_v4());
    let at_str       = encode_dt(Utc::now());

    let outcome: UpsertOutcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let identity_ok: bool = tx
          .query_row(
            "SELECT 1 FROM identities WHERE identity_id = ?1 AND active = 1",
            rusqlite::params![identity_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !identity_ok {
          return Ok(UpsertOutcome::MissingIdentity);
        }

        let group_ok: bool = tx
          .query_row(
            "SELECT 1 FROM groups WHERE group_id = ?1 AND active = 1",
            rusqlite::params![group_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !group_ok {
          return Ok(UpsertOutcome::MissingGroup);
        }

        // The single historical row for the pair, if any.
        let existing: Option<(String, bool)> = tx
          .query_row(
            "SELECT membership_id, active FROM memberships
             WHERE identity_id = ?1 AND group_id = ?2",
            rusqlite::params![identity_str, group_str],
            |r| Ok((r.get(0)?, r.get(1)?)),
          )
          .optional()?;

        let membership_id = match existing {
          Some((_, true)) => return Ok(UpsertOutcome::ActiveExists),
          Some((existing_id, false)) => {
            tx.execute(
              "UPDATE memberships SET role = ?1, active = 1, updated_at = ?2
               WHERE membership_id = ?3",
              rusqlite::params![role_str, at_str, existing_id],
            )?;
            existing_id
          }
          None => {
            tx.execute(
              "INSERT INTO memberships
                 (membership_id, identity_id, group_id, role, active, created_at, updated_at)
               VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)",
              rusqlite::params![new_id_str, identity_str, group_str, role_str, at_str],
            )?;
            new_id_str
          }
        };

        let raw = tx.query_row(
          &format!("SELECT {MEMBERSHIP_COLS} FROM memberships WHERE membership_id = ?1"),
          rusqlite::params![membership_id],
          membership_from_row,
        )?;
        tx.commit()?;
        Ok(UpsertOutcome::Done(raw))
      })
      .await?;

    match outcome {
      UpsertOutcome::Done(raw) => raw.into_membership(),
      UpsertOutcome::ActiveExists => Err(Error::DuplicateMembership { identity_id, group_id }),
      UpsertOutcome::MissingIdentity => Err(Error::IdentityNotFound(identity_id)),
      UpsertOutcome::MissingGroup => Err(Error::GroupNotFound(group_id)),
    }
  }

  async fn deactivate_membership(&self, identity_id: Uuid, group_id: Uuid) -> Result<()> {
    let identity_str = encode_uuid(identity_id);
    let group_str    = encode_uuid(group_id);
    let at_str       = encode_dt(Utc::now());

    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE memberships SET active = 0, updated_at = ?1
           WHERE identity_id = ?2 AND group_id = ?3 AND active = 1",
          rusqlite::params![at_str, identity_str, group_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::MembershipNotFound { identity_id, group_id });
    }
    Ok(())
  }

  async fn change_membership_role(
    &self,
    identity_id: Uuid,
    group_id: Uuid,
    role: Role,
  ) -> Result<Membership> {
    let identity_str = encode_uuid(identity_id);
    let group_str    = encode_uuid(group_id);
    let role_str     = role.as_str().to_owned();
    let at_str       = encode_dt(Utc::now());

    let raw: Option<RawMembership> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let changed = tx.execute(
          "UPDATE memberships SET role = ?1, updated_at = ?2
           WHERE identity_id = ?3 AND group_id = ?4 AND active = 1",
          rusqlite::params![role_str, at_str, identity_str, group_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }

        let raw = tx.query_row(
          &format!(
            "SELECT {MEMBERSHIP_COLS} FROM memberships
             WHERE identity_id = ?1 AND group_id = ?2"
          ),
          rusqlite::params![identity_str, group_str],
          membership_from_row,
        )?;
        tx.commit()?;
        Ok(Some(raw))
      })
      .await?;

    match raw {
      Some(raw) => raw.into_membership(),
      None => Err(Error::MembershipNotFound { identity_id, group_id }),
    }
  }

  async fn memberships_for_identity(&self, identity_id: Uuid) -> Result<Vec<Membership>> {
    let identity_str = encode_uuid(identity_id);

    let raws: Vec<RawMembership> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MEMBERSHIP_COLS} FROM memberships
           WHERE identity_id = ?1 AND active = 1
           ORDER BY rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![identity_str], membership_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMembership::into_membership).collect()
  }

  async fn memberships_for_group(
    &self,
    group_id: Uuid,
    filter: MembershipFilter,
  ) -> Result<Vec<Membership>> {
    let group_str = encode_uuid(group_id);
    let role_str  = filter.role.map(|r| r.as_str().to_owned());
    let active    = filter.active;

    let raws: Vec<RawMembership> = self
      .conn
      .call(move |conn| {
        let mut sql = format!(
          "SELECT {MEMBERSHIP_COLS} FROM memberships WHERE group_id = ?1"
        );
        if role_str.is_some() {
          sql.push_str(" AND role = ?2");
        }
        if let Some(flag) = active {
          sql.push_str(if flag { " AND active = 1" } else { " AND active = 0" });
        }
        sql.push_str(" ORDER BY rowid");

        let mut stmt = conn.prepare(&sql)?;
        let rows = if let Some(role) = role_str {
          stmt
            .query_map(rusqlite::params![group_str, role], membership_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          stmt
            .query_map(rusqlite::params![group_str], membership_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMembership::into_membership).collect()
  }

  async fn count_active_memberships(&self, group_id: Uuid) -> Result<u64> {
    let group_str = encode_uuid(group_id);

    let count: u64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM memberships WHERE group_id = ?1 AND active = 1",
          rusqlite::params![group_str],
          |r| r.get(0),
        )?)
      })
      .await?;

    Ok(count)
  }

  async fn active_role(&self, identity_id: Uuid, group_id: Uuid) -> Result<Option<String>> {
    let identity_str = encode_uuid(identity_id);
    let group_str    = encode_uuid(group_id);

    let role: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT role FROM memberships
               WHERE identity_id = ?1 AND group_id = ?2 AND active = 1",
              rusqlite::params![identity_str, group_str],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    Ok(role)
  }

  // ── Sessions ──────────────────────────────────────────────────────────────

  async fn create_session(&self, input: NewSession) -> Result<Session> {
    let session = Session {
      session_id: Uuid::new_v4(),
      identity_id: input.identity_id,
      token_digest: input.token_digest,
      created_at: Utc::now(),
      expires_at: input.expires_at,
      revoked: false,
      active_context: None,
    };

    let id_str       = encode_uuid(session.session_id);
    let identity_str = encode_uuid(session.identity_id);
    let digest       = session.token_digest.clone();
    let created_str  = encode_dt(session.created_at);
    let expires_str  = encode_dt(session.expires_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions
             (session_id, identity_id, token_digest, created_at, expires_at, revoked)
           VALUES (?1, ?2, ?3, ?4, ?5, 0)",
          rusqlite::params![id_str, identity_str, digest, created_str, expires_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(session)
  }

  async fn find_session_by_token_digest(&self, digest: &str) -> Result<Option<Session>> {
    let digest = digest.to_owned();

    let raw: Option<RawSession> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {SESSION_COLS} FROM sessions WHERE token_digest = ?1"),
              rusqlite::params![digest],
              session_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSession::into_session).transpose()
  }

  async fn set_session_context(
    &self,
    session_id: Uuid,
    group_id: Uuid,
    role: Role,
  ) -> Result<()> {
    let id_str    = encode_uuid(session_id);
    let group_str = encode_uuid(group_id);
    let role_str  = role.as_str().to_owned();

    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE sessions SET context_group_id = ?1, context_role = ?2
           WHERE session_id = ?3",
          rusqlite::params![group_str, role_str, id_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::SessionNotFound(session_id));
    }
    Ok(())
  }

  async fn revoke_session(&self, session_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(session_id);

    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE sessions SET revoked = 1 WHERE session_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::SessionNotFound(session_id));
    }
    Ok(())
  }
}
