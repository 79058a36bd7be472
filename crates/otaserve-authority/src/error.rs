//! Authority error types.

use otaserve_version::ParseError;

use crate::descriptor::DescriptorError;

/// Errors from update checks and firmware publishing.
///
/// "No update" is not an error; see [`crate::UpdateDecision::NoUpdate`].
#[derive(Debug, thiserror::Error)]
pub enum AuthorityError {
  /// The upload descriptor has no usable version declaration.
  #[error("malformed descriptor: {0}")]
  MalformedDescriptor(#[from] DescriptorError),

  /// A version string failed to parse.
  #[error(transparent)]
  InvalidVersion(#[from] ParseError),

  /// The artifact vanished between listing and opening.
  #[error("artifact not found: {0}")]
  ArtifactNotFound(String),

  /// Nothing has ever been published.
  #[error("no firmware available")]
  NoFirmwareAvailable,

  /// The uploaded firmware binary was empty.
  #[error("firmware binary is empty")]
  EmptyFirmware,

  /// The artifact store could not be read or written.
  #[error("artifact store unavailable: {source}")]
  StoreUnavailable {
    #[source]
    source: otaserve_artifact::Error,
  },
}

impl From<otaserve_artifact::Error> for AuthorityError {
  fn from(err: otaserve_artifact::Error) -> Self {
    match err {
      otaserve_artifact::Error::InvalidVersion(e) => AuthorityError::InvalidVersion(e),
      otaserve_artifact::Error::NotFound(version) => AuthorityError::ArtifactNotFound(version),
      otaserve_artifact::Error::Empty => AuthorityError::EmptyFirmware,
      source @ otaserve_artifact::Error::Unavailable { .. } => {
        AuthorityError::StoreUnavailable { source }
      }
    }
  }
}
