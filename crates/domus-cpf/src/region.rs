//! Fiscal-region lookup for CPF numbers.
//!
//! The Receita Federal assigns CPF prefixes per fiscal region. The mapping
//! here is keyed on the first two digits (`01`..`10`); every other prefix is
//! [`Region::Unknown`]. The lookup is advisory metadata only — it never
//! participates in validity decisions.

use serde::{Deserialize, Serialize};

/// A Receita Federal fiscal region, numbered 1ª to 10ª.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
  Fiscal1,
  Fiscal2,
  Fiscal3,
  Fiscal4,
  Fiscal5,
  Fiscal6,
  Fiscal7,
  Fiscal8,
  Fiscal9,
  Fiscal10,
  /// Prefix outside the known `01`..`10` table.
  Unknown,
}

impl Region {
  /// Resolve a region from the first two digits of a cleaned CPF.
  pub fn from_prefix(prefix: &str) -> Region {
    match prefix {
      "01" => Region::Fiscal1,
      "02" => Region::Fiscal2,
      "03" => Region::Fiscal3,
      "04" => Region::Fiscal4,
      "05" => Region::Fiscal5,
      "06" => Region::Fiscal6,
      "07" => Region::Fiscal7,
      "08" => Region::Fiscal8,
      "09" => Region::Fiscal9,
      "10" => Region::Fiscal10,
      _ => Region::Unknown,
    }
  }

  /// The states covered by this fiscal region.
  pub fn states(self) -> &'static str {
    match self {
      Region::Fiscal1 => "Distrito Federal, Goiás, Mato Grosso do Sul and Tocantins",
      Region::Fiscal2 => "Pará, Amazonas, Acre, Amapá, Rondônia and Roraima",
      Region::Fiscal3 => "Ceará, Maranhão and Piauí",
      Region::Fiscal4 => "Pernambuco, Rio Grande do Norte, Paraíba and Alagoas",
      Region::Fiscal5 => "Bahia and Sergipe",
      Region::Fiscal6 => "Minas Gerais",
      Region::Fiscal7 => "Rio de Janeiro and Espírito Santo",
      Region::Fiscal8 => "São Paulo",
      Region::Fiscal9 => "Paraná and Santa Catarina",
      Region::Fiscal10 => "Rio Grande do Sul",
      Region::Unknown => "unidentified region",
    }
  }
}
