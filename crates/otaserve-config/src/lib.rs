//! otaserve Config
//!
//! This crate contains the serializable server configuration for otaserve.
//! Every field has a default, so an empty JSON object (or no file at all) is
//! a working configuration:
//!
//! ```json
//! {
//!   "bind": "0.0.0.0:7070",
//!   "firmware_dir": "./firmwares",
//!   "version_header": "x-esp8266-version"
//! }
//! ```
//!
//! The CLI loads this from `--config=<path>` and then applies flag overrides.

mod error;
mod server;

pub use error::ConfigError;
pub use server::{
  DEFAULT_FIRMWARE_DIR, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_PORT, DEFAULT_VERSION_HEADER,
  ServerConfig,
};
