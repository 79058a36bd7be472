use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use otaserve_artifact::{Artifact, ByteStream, Store};
use otaserve_version::Version;
use tracing::{info, warn};

use crate::descriptor;
use crate::error::AuthorityError;

/// The outcome of an update check.
#[derive(Debug)]
pub enum UpdateDecision {
  /// The device should keep its current firmware.
  NoUpdate(NoUpdateReason),

  /// A strictly newer firmware exists; stream this artifact to the device.
  UpdateAvailable(Artifact),
}

/// Why a check did not result in an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoUpdateReason {
  /// The device reported no version, or one that is not a valid semantic
  /// version. Such devices are never updated: guessing either "oldest" or
  /// "newest" could push a regression.
  Unparsable { reported: Option<String> },

  /// The device already runs the latest version or something newer.
  UpToDate { reported: Version, latest: Version },
}

impl fmt::Display for NoUpdateReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      NoUpdateReason::Unparsable { reported: None } => {
        f.write_str("No update available: no version reported")
      }
      NoUpdateReason::Unparsable {
        reported: Some(reported),
      } => write!(
        f,
        "No update available: reported version {reported:?} is not a valid semantic version"
      ),
      NoUpdateReason::UpToDate { reported, latest } => {
        write!(f, "No update available: {reported} >= {latest}")
      }
    }
  }
}

/// Decides which firmware a device should run and publishes new firmware.
///
/// # Usage
///
/// ```ignore
/// let authority = VersionAuthority::new(Arc::new(FsStore::new("./firmwares")));
///
/// match authority.check_for_update(Some("1.1.0")).await? {
///   UpdateDecision::UpdateAvailable(artifact) => { /* stream artifact.stream */ }
///   UpdateDecision::NoUpdate(reason) => println!("{reason}"),
/// }
/// ```
pub struct VersionAuthority<S> {
  store: Arc<S>,
}

impl<S> Clone for VersionAuthority<S> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
    }
  }
}

impl<S: Store> VersionAuthority<S> {
  /// Create an authority over the given artifact store.
  pub fn new(store: Arc<S>) -> Self {
    Self { store }
  }

  /// The underlying artifact store.
  pub fn store(&self) -> &S {
    &self.store
  }

  /// The highest stored version, or `None` when the store is empty.
  pub async fn latest_version(&self) -> Result<Option<Version>, AuthorityError> {
    Ok(self.store.list_versions().await?.pop_last())
  }

  /// Decide whether a device running `reported` should update.
  ///
  /// An empty store is an error ([`AuthorityError::NoFirmwareAvailable`])
  /// even for a device whose report is unparsable, since it points at a
  /// deployment problem rather than a current device.
  pub async fn check_for_update(
    &self,
    reported: Option<&str>,
  ) -> Result<UpdateDecision, AuthorityError> {
    let latest = self
      .latest_version()
      .await?
      .ok_or(AuthorityError::NoFirmwareAvailable)?;

    let reported = match reported.map(|raw| (raw, Version::parse(raw))) {
      Some((_, Ok(version))) => version,
      Some((raw, Err(e))) => {
        warn!(reported = %raw, error = %e, "ignoring check with unparsable version");
        return Ok(UpdateDecision::NoUpdate(NoUpdateReason::Unparsable {
          reported: Some(raw.to_string()),
        }));
      }
      None => {
        warn!("ignoring check with no reported version");
        return Ok(UpdateDecision::NoUpdate(NoUpdateReason::Unparsable {
          reported: None,
        }));
      }
    };

    if latest.cmp_precedence(&reported) != Ordering::Greater {
      info!(reported = %reported, latest = %latest, "no update available");
      return Ok(UpdateDecision::NoUpdate(NoUpdateReason::UpToDate {
        reported,
        latest,
      }));
    }

    info!(reported = %reported, latest = %latest, "update available");
    let artifact = self.store.open(&latest).await?;
    Ok(UpdateDecision::UpdateAvailable(artifact))
  }

  /// Publish `firmware` under the version declared in `descriptor`.
  ///
  /// The descriptor is validated before any of the firmware is written, and
  /// the store parses the declared version before creating anything, so a
  /// rejected upload never touches the store.
  pub async fn publish_firmware(
    &self,
    descriptor: &[u8],
    firmware: ByteStream,
  ) -> Result<Version, AuthorityError> {
    let declared = descriptor::extract_version(descriptor)?;
    let version = self.store.publish(declared, firmware).await?;
    info!(version = %version, "firmware published");
    Ok(version)
  }
}
