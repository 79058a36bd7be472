//! otaserve Artifact
//!
//! This crate provides the firmware artifact storage trait and its filesystem
//! implementation. An artifact is an opaque, non-empty firmware binary
//! addressed by exactly one semantic version; publishing a version that
//! already exists replaces it.
//!
//! The [`Store`] trait is the only way the rest of the system touches stored
//! firmware. Listing is recomputed on every call, so there is no cache to
//! invalidate when another process publishes.
//!
//! The trait uses async streaming for efficient handling of large images.

mod fs;

pub use fs::{FsStore, artifact_file_name, version_from_file_name};

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use otaserve_version::{ParseError, Version};

/// A boxed stream of bytes for artifact data.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, Error>> + Send>>;

/// Wrap an in-memory buffer as a single-chunk [`ByteStream`].
pub fn byte_stream(data: impl Into<Bytes>) -> ByteStream {
  let data = data.into();
  Box::pin(futures::stream::once(async move { Ok(data) }))
}

/// Error type for artifact storage operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// The version string given to publish is not a valid semantic version.
  #[error(transparent)]
  InvalidVersion(#[from] ParseError),

  /// The requested artifact does not exist (possibly removed or replaced
  /// between listing and opening).
  #[error("artifact not found: {0}")]
  NotFound(String),

  /// Publish received a zero-length payload.
  #[error("artifact content is empty")]
  Empty,

  /// The backing location could not be listed, read or written.
  #[error("store unavailable at {}: {source}", path.display())]
  Unavailable {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// An open firmware artifact, ready to be streamed.
pub struct Artifact {
  /// The version this artifact is stored under.
  pub version: Version,

  /// Content length in bytes, taken when the artifact was opened.
  pub size: u64,

  /// The artifact content.
  pub stream: ByteStream,
}

impl Artifact {
  /// Drain the stream into a single buffer.
  pub async fn into_bytes(self) -> Result<Bytes, Error> {
    let mut buf = BytesMut::with_capacity(self.size as usize);
    let mut stream = self.stream;
    while let Some(chunk) = stream.next().await {
      buf.extend_from_slice(&chunk?);
    }
    Ok(buf.freeze())
  }
}

impl fmt::Debug for Artifact {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Artifact")
      .field("version", &self.version)
      .field("size", &self.size)
      .finish_non_exhaustive()
  }
}

/// Firmware artifact storage trait.
///
/// At most one artifact exists per version. Implementations must never let a
/// reader observe a partially written artifact.
#[async_trait]
pub trait Store: Send + Sync {
  /// Enumerate every stored version. An empty store yields an empty set.
  async fn list_versions(&self) -> Result<BTreeSet<Version>, Error>;

  /// Open the artifact stored under `version` for reading.
  async fn open(&self, version: &Version) -> Result<Artifact, Error>;

  /// Store `data` under `version`, replacing any existing artifact.
  ///
  /// Returns the parsed version the artifact was committed under.
  async fn publish(&self, version: &str, data: ByteStream) -> Result<Version, Error>;
}
