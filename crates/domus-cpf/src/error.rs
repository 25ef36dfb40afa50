//! Error types for the domus-cpf validator.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("CPF must have 11 digits, got {0}")]
  Length(usize),

  #[error("CPF with all digits equal is not valid")]
  RepeatedDigits,

  #[error("CPF check digits do not match")]
  Checksum,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
