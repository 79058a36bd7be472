//! otaserve Version
//!
//! Semantic versions as used to address firmware artifacts. A [`Version`] is
//! parsed strictly from the SemVer 2.0.0 grammar
//! (`MAJOR.MINOR.PATCH[-PRERELEASE][+BUILD]`); anything else is a
//! [`ParseError`], never a coerced default.
//!
//! Two orderings are exposed:
//! - [`Version::cmp_precedence`] is SemVer precedence, which ignores build
//!   metadata. Update decisions use this one.
//! - [`Ord`] is precedence followed by build metadata, making it total and
//!   consistent with [`Eq`]. Picking the maximum of a set uses this one.

mod error;
mod identifier;
mod version;

pub use error::{ParseError, ParseErrorKind};
pub use identifier::Identifier;
pub use version::Version;
