//! Firmware version descriptors.
//!
//! A descriptor is the small text file uploaded next to a firmware binary
//! that declares its version, typically the project's version header:
//!
//! ```text
//! #define FIRMWARE_VERSION "1.2.3"
//! ```
//!
//! `FIRMWARE_VERSION = "1.2.3"` and `FIRMWARE_VERSION: "1.2.3"` are accepted
//! too. When the token appears more than once the last declaration wins.

const TOKEN: &str = "FIRMWARE_VERSION";

/// Why no version could be located in a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError {
  #[error("descriptor is not valid UTF-8")]
  NotUtf8,

  #[error("no FIRMWARE_VERSION \"...\" declaration found")]
  MissingDeclaration,

  #[error("FIRMWARE_VERSION value has no closing quote")]
  UnterminatedQuote,

  #[error("FIRMWARE_VERSION value is empty")]
  EmptyVersion,
}

/// Locate the declared version string in a descriptor.
///
/// The returned string is trimmed but otherwise not validated; callers parse
/// it as a semantic version.
pub fn extract_version(descriptor: &[u8]) -> Result<&str, DescriptorError> {
  let text = std::str::from_utf8(descriptor).map_err(|_| DescriptorError::NotUtf8)?;

  let declared = text
    .match_indices(TOKEN)
    .filter(|(idx, _)| starts_identifier(text, *idx))
    .filter_map(|(idx, _)| quoted_value(&text[idx + TOKEN.len()..]))
    .last()
    .ok_or(DescriptorError::MissingDeclaration)??;

  let version = declared.trim();
  if version.is_empty() {
    return Err(DescriptorError::EmptyVersion);
  }
  Ok(version)
}

/// The token must not be the tail of a longer identifier such as
/// `OLD_FIRMWARE_VERSION`.
fn starts_identifier(text: &str, idx: usize) -> bool {
  text[..idx]
    .chars()
    .next_back()
    .is_none_or(|c| !(c.is_alphanumeric() || c == '_'))
}

/// Parse `<ws>[=|:]<ws>"value"` following the token.
///
/// Returns `None` when no opening quote follows (not a declaration, e.g.
/// `#ifdef FIRMWARE_VERSION`), and an error when the quote never closes on
/// the same line.
fn quoted_value(rest: &str) -> Option<Result<&str, DescriptorError>> {
  let rest = rest.trim_start_matches([' ', '\t']);
  let rest = rest.strip_prefix(['=', ':']).unwrap_or(rest);
  let rest = rest.trim_start_matches([' ', '\t']);
  let value = rest.strip_prefix('"')?;

  match value.find(['"', '\n']) {
    Some(end) if value[end..].starts_with('"') => Some(Ok(&value[..end])),
    _ => Some(Err(DescriptorError::UnterminatedQuote)),
  }
}
