use std::cmp::Ordering;
use std::fmt;

use crate::error::ParseErrorKind;

/// A single dot-separated pre-release identifier.
///
/// Numeric identifiers compare numerically and always sort below
/// alphanumeric ones; alphanumeric identifiers compare in ASCII order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
  Numeric(u64),
  AlphaNumeric(String),
}

impl Identifier {
  /// Parse a pre-release identifier.
  pub(crate) fn parse_prerelease(part: &str) -> Result<Self, ParseErrorKind> {
    validate_chars(part)?;

    if part.bytes().all(|b| b.is_ascii_digit()) {
      if part.len() > 1 && part.starts_with('0') {
        return Err(ParseErrorKind::LeadingZero {
          part: part.to_string(),
        });
      }
      let n = part
        .parse::<u64>()
        .map_err(|_| ParseErrorKind::InvalidNumber {
          part: part.to_string(),
        })?;
      return Ok(Identifier::Numeric(n));
    }

    Ok(Identifier::AlphaNumeric(part.to_string()))
  }
}

/// Check a pre-release or build identifier is non-empty `[0-9A-Za-z-]+`.
pub(crate) fn validate_chars(part: &str) -> Result<(), ParseErrorKind> {
  if part.is_empty() {
    return Err(ParseErrorKind::EmptyIdentifier);
  }
  match part
    .chars()
    .find(|c| !(c.is_ascii_alphanumeric() || *c == '-'))
  {
    Some(ch) => Err(ParseErrorKind::InvalidCharacter { ch }),
    None => Ok(()),
  }
}

impl Ord for Identifier {
  fn cmp(&self, other: &Self) -> Ordering {
    match (self, other) {
      (Identifier::Numeric(a), Identifier::Numeric(b)) => a.cmp(b),
      (Identifier::Numeric(_), Identifier::AlphaNumeric(_)) => Ordering::Less,
      (Identifier::AlphaNumeric(_), Identifier::Numeric(_)) => Ordering::Greater,
      (Identifier::AlphaNumeric(a), Identifier::AlphaNumeric(b)) => a.as_bytes().cmp(b.as_bytes()),
    }
  }
}

impl PartialOrd for Identifier {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl fmt::Display for Identifier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Identifier::Numeric(n) => write!(f, "{n}"),
      Identifier::AlphaNumeric(s) => f.write_str(s),
    }
  }
}
