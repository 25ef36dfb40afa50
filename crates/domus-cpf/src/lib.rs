//! CPF (Cadastro de Pessoas Físicas) validation for Domus.
//!
//! Pure synchronous functions; no I/O. Pipeline:
//!   raw &str
//!     └─ clean()      → digit string
//!          └─ is_valid() / format() / Cpf::parse()
//!
//! A CPF is 11 decimal digits, the last two of which are check digits
//! computed from the first nine with a mod-11 weighted sum. All-equal-digit
//! strings pass the checksum arithmetically and are rejected explicitly.

pub mod error;
mod region;

use core::str::FromStr;

use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};

pub use error::{Error, Result};
pub use region::Region;

// ─── Free functions ──────────────────────────────────────────────────────────

/// Strip every non-digit character. Never fails; any input yields a
/// (possibly empty) digit string.
pub fn clean(raw: &str) -> String {
  raw.chars().filter(char::is_ascii_digit).collect()
}

/// Whether `raw` cleans to a checksum-valid, not-all-equal 11-digit CPF.
///
/// Returns `false` for every malformed input; never panics.
pub fn is_valid(raw: &str) -> bool {
  validate_digits(&clean(raw)).is_ok()
}

/// Render `raw` in the canonical `XXX.XXX.XXX-XX` mask.
///
/// Fails with [`Error::Length`] when the cleaned input is not 11 digits.
/// The checksum is deliberately not consulted here: formatting is a
/// presentation concern and callers may need to display rejected input.
pub fn format(raw: &str) -> Result<String> {
  let digits = clean(raw);
  if digits.len() != 11 {
    return Err(Error::Length(digits.len()));
  }
  Ok(mask(&digits))
}

/// Fiscal region for `raw`, keyed on its first two cleaned digits.
///
/// Unknown or short prefixes yield [`Region::Unknown`], never an error.
pub fn region(raw: &str) -> Region {
  let digits = clean(raw);
  match digits.get(..2) {
    Some(prefix) => Region::from_prefix(prefix),
    None => Region::Unknown,
  }
}

/// Generate a formatted, always-valid CPF for test fixtures.
///
/// Nine base digits come from OS randomness; the two check digits are
/// computed. All-equal bases are re-rolled so the result never hits the
/// repeated-digits rejection.
pub fn generate() -> String {
  let mut digits: Vec<u8>;
  loop {
    digits = (0..9).map(|_| (OsRng.next_u32() % 10) as u8).collect();
    if digits.iter().any(|&d| d != digits[0]) {
      break;
    }
  }
  let first = check_digit(&digits);
  digits.push(first);
  let second = check_digit(&digits);
  digits.push(second);

  let text: String = digits.iter().map(|d| (d + b'0') as char).collect();
  mask(&text)
}

// ─── Checksum internals ──────────────────────────────────────────────────────

/// Compute one check digit over `digits` (9 for the first, 10 for the
/// second). Weight for position `i` is `len + 1 - i`; the digit is 0 when
/// the mod-11 remainder is below 2, otherwise `11 - remainder`.
fn check_digit(digits: &[u8]) -> u8 {
  let n = digits.len() as u32;
  let sum: u32 = digits
    .iter()
    .enumerate()
    .map(|(i, &d)| u32::from(d) * (n + 1 - i as u32))
    .sum();
  let remainder = sum % 11;
  if remainder < 2 { 0 } else { (11 - remainder) as u8 }
}

fn mask(digits: &str) -> String {
  format!(
    "{}.{}.{}-{}",
    &digits[..3],
    &digits[3..6],
    &digits[6..9],
    &digits[9..]
  )
}

/// Validate an already-cleaned digit string.
fn validate_digits(digits: &str) -> Result<()> {
  if digits.len() != 11 {
    return Err(Error::Length(digits.len()));
  }

  let values: Vec<u8> = digits.bytes().map(|b| b - b'0').collect();
  if values.iter().all(|&d| d == values[0]) {
    return Err(Error::RepeatedDigits);
  }

  if check_digit(&values[..9]) != values[9] || check_digit(&values[..10]) != values[10] {
    return Err(Error::Checksum);
  }

  Ok(())
}

// ─── Cpf value object ────────────────────────────────────────────────────────

/// A checksum-validated CPF, held in canonical unmasked form (11 digits).
///
/// Construction goes through [`Cpf::parse`], so a value of this type is
/// always valid. Serialization emits the unmasked digits; deserialization
/// re-validates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cpf(String);

impl Cpf {
  /// Clean and validate `raw`, accepting masked or unmasked input.
  pub fn parse(raw: &str) -> Result<Self> {
    let digits = clean(raw);
    validate_digits(&digits)?;
    Ok(Cpf(digits))
  }

  /// The canonical 11-digit unmasked form.
  pub fn as_digits(&self) -> &str {
    &self.0
  }

  /// The `XXX.XXX.XXX-XX` display mask.
  pub fn formatted(&self) -> String {
    mask(&self.0)
  }

  pub fn region(&self) -> Region {
    Region::from_prefix(&self.0[..2])
  }
}

impl FromStr for Cpf {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    Cpf::parse(s)
  }
}

impl TryFrom<String> for Cpf {
  type Error = Error;

  fn try_from(value: String) -> Result<Self> {
    Cpf::parse(&value)
  }
}

impl From<Cpf> for String {
  fn from(value: Cpf) -> Self {
    value.0
  }
}

impl core::fmt::Display for Cpf {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.write_str(&self.formatted())
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  const VALID: &str = "52998224725";

  #[test]
  fn clean_strips_everything_but_digits() {
    assert_eq!(clean("529.982.247-25"), VALID);
    assert_eq!(clean("abc 5-2/9"), "529");
    assert_eq!(clean(""), "");
    assert_eq!(clean("no digits at all"), "");
  }

  #[test]
  fn known_valid_cpf_passes() {
    assert!(is_valid(VALID));
    assert!(is_valid("529.982.247-25"));
  }

  #[test]
  fn mutating_the_last_digit_invalidates() {
    for d in 0..10u8 {
      if d == 5 {
        continue;
      }
      let mutated = format!("5299822472{d}");
      assert!(!is_valid(&mutated), "mutation {mutated} slipped through");
    }
  }

  #[test]
  fn checksum_catches_most_single_digit_errors() {
    // The 0-if-remainder-below-2 collapse lets a small fraction of
    // single-digit errors through; anything under 89% caught means the
    // arithmetic is wrong.
    let mut total = 0u32;
    let mut caught = 0u32;
    for pos in 0..11 {
      for d in b'0'..=b'9' {
        let mut bytes = VALID.as_bytes().to_vec();
        if bytes[pos] == d {
          continue;
        }
        bytes[pos] = d;
        let mutated = String::from_utf8(bytes).unwrap();
        total += 1;
        if !is_valid(&mutated) {
          caught += 1;
        }
      }
    }
    assert!(
      f64::from(caught) / f64::from(total) > 0.89,
      "caught only {caught}/{total} single-digit mutations"
    );
  }

  #[test]
  fn all_equal_digit_strings_are_rejected() {
    for d in b'0'..=b'9' {
      let s: String = (0..11).map(|_| d as char).collect();
      assert!(!is_valid(&s));
      assert_eq!(Cpf::parse(&s), Err(Error::RepeatedDigits));
    }
  }

  #[test]
  fn wrong_length_is_invalid_not_a_panic() {
    assert!(!is_valid(""));
    assert!(!is_valid("5299822472"));
    assert!(!is_valid("529982247255"));
    assert!(!is_valid("עברית"));
  }

  #[test]
  fn format_round_trips_through_clean() {
    assert_eq!(format(&clean("529.982.247-25")).unwrap(), "529.982.247-25");
    assert_eq!(format(VALID).unwrap(), "529.982.247-25");
  }

  #[test]
  fn format_rejects_wrong_lengths() {
    assert_eq!(format("123"), Err(Error::Length(3)));
    assert_eq!(format(""), Err(Error::Length(0)));
  }

  #[test]
  fn generate_is_always_valid() {
    for _ in 0..1000 {
      let cpf = generate();
      assert!(is_valid(&cpf), "generated invalid CPF: {cpf}");
      let digits = clean(&cpf);
      assert!(digits.bytes().any(|b| b != digits.as_bytes()[0]));
    }
  }

  #[test]
  fn generate_does_not_collapse_to_few_values() {
    let mut seen = std::collections::HashSet::new();
    for _ in 0..200 {
      seen.insert(generate());
    }
    // 9 random base digits; 200 draws colliding down to fewer than 100
    // distinct values would mean broken randomness.
    assert!(seen.len() > 100, "only {} distinct CPFs", seen.len());
  }

  #[test]
  fn cpf_value_object_is_canonical() {
    let cpf = Cpf::parse("529.982.247-25").unwrap();
    assert_eq!(cpf.as_digits(), VALID);
    assert_eq!(cpf.formatted(), "529.982.247-25");
    assert_eq!(cpf.to_string(), "529.982.247-25");
    assert_eq!(cpf, Cpf::parse(VALID).unwrap());
  }

  #[test]
  fn cpf_parse_rejects_bad_checksum() {
    assert_eq!(Cpf::parse("52998224724"), Err(Error::Checksum));
    assert_eq!(Cpf::parse("123"), Err(Error::Length(3)));
  }

  #[test]
  fn region_lookup() {
    assert_eq!(region("52998224725"), Region::Unknown);
    assert_eq!(region("01998224725"), Region::Fiscal1);
    assert_eq!(region(""), Region::Unknown);
    assert_eq!(Region::Fiscal8.states(), "São Paulo");
  }
}
