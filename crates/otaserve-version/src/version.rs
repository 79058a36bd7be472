use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ParseError, ParseErrorKind};
use crate::identifier::{self, Identifier};

/// A semantic version: `MAJOR.MINOR.PATCH[-PRERELEASE][+BUILD]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
  pub major: u64,
  pub minor: u64,
  pub patch: u64,

  /// Pre-release identifiers; empty for a normal release.
  pub pre: Vec<Identifier>,

  /// Build metadata identifiers. Ignored for precedence.
  pub build: Vec<String>,
}

impl Version {
  /// A plain release version with no pre-release or build metadata.
  pub fn new(major: u64, minor: u64, patch: u64) -> Self {
    Self {
      major,
      minor,
      patch,
      pre: Vec::new(),
      build: Vec::new(),
    }
  }

  /// Parse a version string. Surrounding whitespace and a `v` prefix are
  /// rejected rather than stripped.
  pub fn parse(input: &str) -> Result<Self, ParseError> {
    Self::parse_inner(input).map_err(|kind| ParseError::new(input, kind))
  }

  fn parse_inner(input: &str) -> Result<Self, ParseErrorKind> {
    if input.is_empty() {
      return Err(ParseErrorKind::Empty);
    }

    let (rest, build) = match input.split_once('+') {
      Some((rest, build)) => (rest, Some(build)),
      None => (input, None),
    };
    let (core, pre) = match rest.split_once('-') {
      Some((core, pre)) => (core, Some(pre)),
      None => (rest, None),
    };

    let parts: Vec<&str> = core.split('.').collect();
    let [major, minor, patch] = parts.as_slice() else {
      return Err(ParseErrorKind::ComponentCount { found: parts.len() });
    };

    let pre = match pre {
      Some(pre) => pre
        .split('.')
        .map(Identifier::parse_prerelease)
        .collect::<Result<Vec<_>, _>>()?,
      None => Vec::new(),
    };

    let build = match build {
      Some(build) => build
        .split('.')
        .map(|part| identifier::validate_chars(part).map(|()| part.to_string()))
        .collect::<Result<Vec<_>, _>>()?,
      None => Vec::new(),
    };

    Ok(Self {
      major: parse_numeric(major)?,
      minor: parse_numeric(minor)?,
      patch: parse_numeric(patch)?,
      pre,
      build,
    })
  }

  /// Whether this is a pre-release version.
  pub fn is_prerelease(&self) -> bool {
    !self.pre.is_empty()
  }

  /// Compare by SemVer precedence, ignoring build metadata.
  ///
  /// `1.0.0-alpha < 1.0.0-alpha.1 < 1.0.0-alpha.beta < 1.0.0-beta <
  /// 1.0.0-beta.2 < 1.0.0-beta.11 < 1.0.0-rc.1 < 1.0.0`
  pub fn cmp_precedence(&self, other: &Self) -> Ordering {
    self
      .major
      .cmp(&other.major)
      .then(self.minor.cmp(&other.minor))
      .then(self.patch.cmp(&other.patch))
      .then_with(|| match (self.pre.is_empty(), other.pre.is_empty()) {
        (true, true) => Ordering::Equal,
        // A release outranks any of its pre-releases.
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => self.pre.cmp(&other.pre),
      })
  }
}

fn parse_numeric(part: &str) -> Result<u64, ParseErrorKind> {
  if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
    return Err(ParseErrorKind::InvalidNumber {
      part: part.to_string(),
    });
  }
  if part.len() > 1 && part.starts_with('0') {
    return Err(ParseErrorKind::LeadingZero {
      part: part.to_string(),
    });
  }
  part.parse().map_err(|_| ParseErrorKind::InvalidNumber {
    part: part.to_string(),
  })
}

impl Ord for Version {
  fn cmp(&self, other: &Self) -> Ordering {
    self
      .cmp_precedence(other)
      .then_with(|| self.build.cmp(&other.build))
  }
}

impl PartialOrd for Version {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl FromStr for Version {
  type Err = ParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::parse(s)
  }
}

impl fmt::Display for Version {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
    for (i, id) in self.pre.iter().enumerate() {
      f.write_str(if i == 0 { "-" } else { "." })?;
      write!(f, "{id}")?;
    }
    for (i, id) in self.build.iter().enumerate() {
      f.write_str(if i == 0 { "+" } else { "." })?;
      f.write_str(id)?;
    }
    Ok(())
  }
}

impl Serialize for Version {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for Version {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let s = String::deserialize(deserializer)?;
    Version::parse(&s).map_err(serde::de::Error::custom)
  }
}
