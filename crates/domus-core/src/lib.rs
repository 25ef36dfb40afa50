//! Core types and trait definitions for the Domus directory.
//!
//! This crate holds the domain model of the identity-and-authorization core:
//! identities (people with validated CPFs), groups, role-bearing memberships
//! with soft activation, and login sessions with a single active context.
//! It is deliberately free of HTTP and database dependencies; storage
//! backends implement [`store::DirectoryStore`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod authz;
pub mod context;
pub mod error;
pub mod group;
pub mod identity;
pub mod membership;
pub mod session;
pub mod store;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
