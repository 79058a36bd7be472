use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 7070;
pub const DEFAULT_FIRMWARE_DIR: &str = "./firmwares";
/// The header the ESP8266 Arduino HTTP updater sends its running version in.
pub const DEFAULT_VERSION_HEADER: &str = "x-esp8266-version";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
  /// Address the HTTP server listens on.
  pub bind: SocketAddr,
  /// Directory holding the firmware artifacts.
  pub firmware_dir: PathBuf,
  /// Create `firmware_dir` at startup when it does not exist.
  pub create_dir: bool,
  /// Request header carrying the device's running version.
  pub version_header: String,
  /// Maximum accepted publish request body, in bytes.
  pub max_upload_bytes: usize,
  /// Allow cross-origin requests from any origin.
  pub cors: bool,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
      firmware_dir: PathBuf::from(DEFAULT_FIRMWARE_DIR),
      create_dir: true,
      version_header: DEFAULT_VERSION_HEADER.to_string(),
      max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
      cors: true,
    }
  }
}

impl ServerConfig {
  /// Load a configuration from a JSON file. Missing fields take defaults.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }
}
