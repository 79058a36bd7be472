//! otaserve HTTP
//!
//! Binds the version authority to HTTP:
//!
//! - `GET /update`: devices send their running version in a header (by
//!   default `x-esp8266-version`) and get either `304 Not Modified` or the
//!   firmware binary.
//! - `POST /firmware`: a multipart upload with a `version` descriptor part
//!   and a `firmware` binary part.
//! - `GET /health`: liveness probe.

mod error;
mod routes;
mod server;

pub use error::{HttpError, ServeError};
pub use routes::{FIRMWARE_VERSION_HEADER, REASON_HEADER, create_router};
pub use server::serve;
