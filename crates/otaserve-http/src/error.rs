use std::net::SocketAddr;

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use otaserve_authority::AuthorityError;
use tracing::{error, warn};

/// A failed request, rendered as a status code plus a plain-text reason.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
  #[error(transparent)]
  Authority(#[from] AuthorityError),

  #[error("invalid multipart body: {0}")]
  Multipart(#[from] MultipartError),

  #[error("missing '{0}' part")]
  MissingPart(&'static str),
}

impl HttpError {
  pub fn status(&self) -> StatusCode {
    match self {
      HttpError::Authority(err) => match err {
        AuthorityError::MalformedDescriptor(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AuthorityError::InvalidVersion(_) | AuthorityError::EmptyFirmware => {
          StatusCode::BAD_REQUEST
        }
        AuthorityError::NoFirmwareAvailable => StatusCode::NOT_FOUND,
        AuthorityError::ArtifactNotFound(_) => StatusCode::CONFLICT,
        AuthorityError::StoreUnavailable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
      },
      // Covers 413 when the upload exceeds the body limit.
      HttpError::Multipart(err) => err.status(),
      HttpError::MissingPart(_) => StatusCode::BAD_REQUEST,
    }
  }
}

impl IntoResponse for HttpError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      error!(status = %status, error = %self, "request failed");
    } else {
      warn!(status = %status, error = %self, "request rejected");
    }
    (status, self.to_string()).into_response()
  }
}

/// Errors starting or running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
  #[error("invalid version header name {name:?}")]
  InvalidHeader { name: String },

  #[error("failed to prepare firmware directory: {0}")]
  Store(#[from] otaserve_artifact::Error),

  #[error("failed to bind {addr}: {source}")]
  Bind {
    addr: SocketAddr,
    #[source]
    source: std::io::Error,
  },

  #[error("server error: {0}")]
  Io(#[source] std::io::Error),
}
