//! Error types for `domus-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown role: {0:?}")]
  UnknownRole(String),

  #[error("invalid tax identifier: {0}")]
  InvalidTaxId(#[from] domus_cpf::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
