//! SQLite backend for the Domus directory.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. The read-then-write
//! membership operations execute inside SQLite transactions, which — given
//! the single connection — makes them atomic with respect to each other.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
