//! Version parse errors.

/// A version string that does not follow the SemVer 2.0.0 grammar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid version {input:?}: {kind}")]
pub struct ParseError {
  /// The rejected input, verbatim.
  pub input: String,

  /// What was wrong with it.
  pub kind: ParseErrorKind,
}

impl ParseError {
  pub(crate) fn new(input: &str, kind: ParseErrorKind) -> Self {
    Self {
      input: input.to_string(),
      kind,
    }
  }
}

/// The specific grammar rule a version string broke.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
  #[error("empty version string")]
  Empty,

  /// The `MAJOR.MINOR.PATCH` core did not have exactly three parts.
  #[error("expected 3 dot-separated components, found {found}")]
  ComponentCount { found: usize },

  /// A numeric component was empty, non-numeric or did not fit in a u64.
  #[error("invalid numeric component {part:?}")]
  InvalidNumber { part: String },

  #[error("numeric component {part:?} has a leading zero")]
  LeadingZero { part: String },

  /// A pre-release or build identifier was empty (e.g. `1.0.0-alpha..1`).
  #[error("empty pre-release or build identifier")]
  EmptyIdentifier,

  #[error("invalid character {ch:?} in identifier")]
  InvalidCharacter { ch: char },
}
