//! otaserve Authority
//!
//! The version authority decides whether a device should update and surfaces
//! the artifact to send it, and turns an uploaded descriptor plus binary into
//! a published artifact.
//!
//! The authority keeps no state of its own. Every call reads the artifact
//! store afresh, so any number of authorities (or processes) can share one
//! store.

mod authority;
pub mod descriptor;
mod error;

pub use authority::{NoUpdateReason, UpdateDecision, VersionAuthority};
pub use descriptor::DescriptorError;
pub use error::AuthorityError;
