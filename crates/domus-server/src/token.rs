//! Bearer-token generation and digesting.
//!
//! Tokens are 32 bytes of OS randomness, base64url-encoded. The plaintext
//! token is shown to the client exactly once; only its SHA-256 hex digest
//! is stored, so a leaked database cannot be replayed as sessions.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use rand_core::{OsRng, RngCore as _};
use sha2::{Digest as _, Sha256};

/// Generate a fresh bearer token and its storage digest.
pub fn issue() -> (String, String) {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  let token = B64.encode(bytes);
  let d = digest(&token);
  (token, d)
}

/// Hex SHA-256 of a presented token, for session lookup.
pub fn digest(token: &str) -> String {
  hex::encode(Sha256::digest(token.as_bytes()))
}
