use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::StreamExt;
use otaserve_version::Version;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{Artifact, ByteStream, Error, Store};

const FILE_PREFIX: &str = "firmware_v";
const FILE_SUFFIX: &str = ".bin";

/// The file name an artifact is stored under, e.g. `firmware_v1.2.0.bin`.
pub fn artifact_file_name(version: &Version) -> String {
  format!("{FILE_PREFIX}{version}{FILE_SUFFIX}")
}

/// Extract the version string from an artifact file name.
/// Example: "firmware_v1.2.0.bin" -> "1.2.0"
pub fn version_from_file_name(name: &str) -> Option<&str> {
  name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)
}

/// Filesystem-based artifact store.
///
/// Artifacts live side by side in one flat directory:
/// ```text
/// {root}/
/// ├── firmware_v1.0.0.bin
/// ├── firmware_v1.2.0.bin
/// └── .firmware_v1.3.0.bin.<uuid>.tmp   (publish in progress, never listed)
/// ```
pub struct FsStore {
  root: PathBuf,
}

impl FsStore {
  /// Create a new filesystem store rooted at the given directory.
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  /// Get the root directory of the store.
  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Create the root directory (and parents) if it does not exist.
  pub async fn create_dir_all(&self) -> Result<(), Error> {
    fs::create_dir_all(&self.root)
      .await
      .map_err(|source| self.unavailable(source))
  }

  fn artifact_path(&self, version: &Version) -> PathBuf {
    self.root.join(artifact_file_name(version))
  }

  fn temp_path(&self, version: &Version) -> PathBuf {
    self.root.join(format!(
      ".{}.{}.tmp",
      artifact_file_name(version),
      Uuid::new_v4()
    ))
  }

  fn unavailable(&self, source: io::Error) -> Error {
    Error::Unavailable {
      path: self.root.clone(),
      source,
    }
  }
}

#[async_trait]
impl Store for FsStore {
  async fn list_versions(&self) -> Result<BTreeSet<Version>, Error> {
    let mut entries = fs::read_dir(&self.root)
      .await
      .map_err(|source| self.unavailable(source))?;
    let mut versions = BTreeSet::new();

    while let Some(entry) = entries
      .next_entry()
      .await
      .map_err(|source| self.unavailable(source))?
    {
      let file_name = entry.file_name();
      let name = match file_name.to_str() {
        Some(n) => n,
        None => {
          debug!(file = ?file_name, "skipping non-UTF-8 entry");
          continue;
        }
      };

      let raw = match version_from_file_name(name) {
        Some(raw) => raw,
        None => {
          debug!(file = %name, "skipping non-artifact entry");
          continue;
        }
      };

      let is_file = entry
        .file_type()
        .await
        .map_err(|source| self.unavailable(source))?
        .is_file();
      if !is_file {
        debug!(file = %name, "skipping artifact name that is not a regular file");
        continue;
      }

      match Version::parse(raw) {
        Ok(version) => {
          versions.insert(version);
        }
        Err(e) => debug!(file = %name, error = %e, "skipping artifact with invalid version"),
      }
    }

    Ok(versions)
  }

  async fn open(&self, version: &Version) -> Result<Artifact, Error> {
    let path = self.artifact_path(version);
    let file = File::open(&path).await.map_err(|e| {
      if e.kind() == io::ErrorKind::NotFound {
        Error::NotFound(version.to_string())
      } else {
        Error::Unavailable {
          path: path.clone(),
          source: e,
        }
      }
    })?;
    let size = file
      .metadata()
      .await
      .map_err(|source| Error::Unavailable {
        path: path.clone(),
        source,
      })?
      .len();

    let stream = ReaderStream::new(file).map(move |r| {
      r.map_err(|source| Error::Unavailable {
        path: path.clone(),
        source,
      })
    });

    Ok(Artifact {
      version: version.clone(),
      size,
      stream: Box::pin(stream),
    })
  }

  async fn publish(&self, version: &str, data: ByteStream) -> Result<Version, Error> {
    let version = Version::parse(version)?;
    let temp = TempFile {
      path: self.temp_path(&version),
      committed: false,
    };

    let written = write_stream(&temp.path, data).await?;
    if written == 0 {
      return Err(Error::Empty);
    }

    // Rename within one directory replaces the old artifact in a single step.
    let final_path = self.artifact_path(&version);
    fs::rename(&temp.path, &final_path)
      .await
      .map_err(|source| Error::Unavailable {
        path: final_path.clone(),
        source,
      })?;
    temp.commit();

    info!(version = %version, bytes = written, path = %final_path.display(), "artifact committed");
    Ok(version)
  }
}

/// Stream `data` into a freshly created file at `path`, syncing it to disk.
async fn write_stream(path: &Path, data: ByteStream) -> Result<u64, Error> {
  let unavailable = |source: io::Error| Error::Unavailable {
    path: path.to_path_buf(),
    source,
  };

  let mut file = File::create(path).await.map_err(unavailable)?;
  let mut stream = data;
  let mut written = 0u64;

  while let Some(chunk) = stream.next().await {
    let bytes = chunk?;
    file.write_all(&bytes).await.map_err(unavailable)?;
    written += bytes.len() as u64;
  }

  file.flush().await.map_err(unavailable)?;
  file.sync_all().await.map_err(unavailable)?;
  Ok(written)
}

/// A temporary publish file, removed on drop unless committed.
///
/// Covers early returns as well as the publish future being dropped mid-write.
struct TempFile {
  path: PathBuf,
  committed: bool,
}

impl TempFile {
  fn commit(mut self) {
    self.committed = true;
  }
}

impl Drop for TempFile {
  fn drop(&mut self) {
    if !self.committed {
      let _ = std::fs::remove_file(&self.path);
    }
  }
}
