//! SQL schema for the Domus SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// The partial unique indexes are the storage-level backstop for the
/// active-row uniqueness invariants: tax IDs among active identities,
/// display names among active groups. Memberships carry a *total* unique
/// constraint on the pair — removal flips `active` and re-adding
/// reactivates the same row, so one historical row per pair is all there
/// ever is.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS identities (
    identity_id   TEXT PRIMARY KEY,
    tax_id        TEXT NOT NULL,    -- canonical unmasked 11 digits
    display_name  TEXT NOT NULL,
    password_hash TEXT NOT NULL,    -- argon2 PHC string
    active        INTEGER NOT NULL DEFAULT 1,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL,
    last_login    TEXT
);

CREATE UNIQUE INDEX IF NOT EXISTS identities_tax_id_active_idx
    ON identities(tax_id) WHERE active = 1;

CREATE TABLE IF NOT EXISTS groups (
    group_id     TEXT PRIMARY KEY,
    display_name TEXT NOT NULL,
    kind         TEXT NOT NULL,     -- 'household' | 'company' | 'residence'
    active       INTEGER NOT NULL DEFAULT 1,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS groups_name_active_idx
    ON groups(display_name) WHERE active = 1;

CREATE TABLE IF NOT EXISTS memberships (
    membership_id TEXT PRIMARY KEY,
    identity_id   TEXT NOT NULL REFERENCES identities(identity_id),
    group_id      TEXT NOT NULL REFERENCES groups(group_id),
    role          TEXT NOT NULL,
    active        INTEGER NOT NULL DEFAULT 1,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL,
    UNIQUE (identity_id, group_id)
);

CREATE INDEX IF NOT EXISTS memberships_group_idx    ON memberships(group_id);
CREATE INDEX IF NOT EXISTS memberships_identity_idx ON memberships(identity_id);

CREATE TABLE IF NOT EXISTS sessions (
    session_id       TEXT PRIMARY KEY,
    identity_id      TEXT NOT NULL REFERENCES identities(identity_id),
    token_digest     TEXT NOT NULL UNIQUE,    -- hex SHA-256 of the bearer token
    created_at       TEXT NOT NULL,
    expires_at       TEXT NOT NULL,
    revoked          INTEGER NOT NULL DEFAULT 0,
    context_group_id TEXT,                    -- active context; both set or both NULL
    context_role     TEXT
);

CREATE INDEX IF NOT EXISTS sessions_identity_idx ON sessions(identity_id);

PRAGMA user_version = 1;
";
