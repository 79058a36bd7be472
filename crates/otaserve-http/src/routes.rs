use axum::{
  Json, Router,
  body::Body,
  extract::{DefaultBodyLimit, Multipart, State},
  http::{HeaderMap, HeaderName, StatusCode, header},
  response::{IntoResponse, Response},
  routing::{get, post},
};
use otaserve_artifact::{Artifact, Store, byte_stream};
use otaserve_authority::{UpdateDecision, VersionAuthority};
use otaserve_config::ServerConfig;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::{HttpError, ServeError};

/// Response header carrying the human-readable reason for a `304`.
pub const REASON_HEADER: HeaderName = HeaderName::from_static("x-ota-reason");

/// Response header naming the version of the firmware being served.
pub const FIRMWARE_VERSION_HEADER: HeaderName = HeaderName::from_static("x-firmware-version");

struct AppState<S> {
  authority: VersionAuthority<S>,
  version_header: HeaderName,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      authority: self.authority.clone(),
      version_header: self.version_header.clone(),
    }
  }
}

/// Build the router for the given authority.
pub fn create_router<S: Store + 'static>(
  authority: VersionAuthority<S>,
  config: &ServerConfig,
) -> Result<Router, ServeError> {
  let version_header = HeaderName::try_from(config.version_header.as_str()).map_err(|_| {
    ServeError::InvalidHeader {
      name: config.version_header.clone(),
    }
  })?;
  let state = AppState {
    authority,
    version_header,
  };

  let router = Router::new()
    .route("/update", get(check_update::<S>))
    .route(
      "/firmware",
      post(publish_firmware::<S>).layer(DefaultBodyLimit::max(config.max_upload_bytes)),
    )
    .route("/health", get(health_check))
    .layer(TraceLayer::new_for_http())
    .with_state(state);

  if config.cors {
    let cors = CorsLayer::new()
      .allow_origin(Any)
      .allow_methods(Any)
      .allow_headers(Any);
    return Ok(router.layer(cors));
  }
  Ok(router)
}

#[derive(Serialize)]
struct HealthResponse {
  status: &'static str,
  version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
  Json(HealthResponse {
    status: "ok",
    version: env!("CARGO_PKG_VERSION"),
  })
}

async fn check_update<S: Store + 'static>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
) -> Result<Response, HttpError> {
  // A header that is not visible ASCII is treated like a missing one.
  let reported = headers
    .get(&state.version_header)
    .and_then(|value| value.to_str().ok());

  match state.authority.check_for_update(reported).await? {
    UpdateDecision::NoUpdate(reason) => {
      Ok((StatusCode::NOT_MODIFIED, [(REASON_HEADER, reason.to_string())]).into_response())
    }
    UpdateDecision::UpdateAvailable(Artifact {
      version,
      size,
      stream,
    }) => {
      let headers = [
        (header::CONTENT_TYPE, "application/octet-stream".to_string()),
        (header::CONTENT_LENGTH, size.to_string()),
        (FIRMWARE_VERSION_HEADER, version.to_string()),
      ];
      Ok((StatusCode::OK, headers, Body::from_stream(stream)).into_response())
    }
  }
}

async fn publish_firmware<S: Store + 'static>(
  State(state): State<AppState<S>>,
  mut multipart: Multipart,
) -> Result<&'static str, HttpError> {
  let mut descriptor = None;
  let mut firmware = None;

  // Parts may arrive in either order and the version must be known before
  // the store can commit, so both are buffered (bounded by the body limit).
  while let Some(field) = multipart.next_field().await? {
    let name = field.name().map(str::to_owned);
    match name.as_deref() {
      Some("version") => descriptor = Some(field.bytes().await?),
      Some("firmware") => firmware = Some(field.bytes().await?),
      _ => {}
    }
  }

  let descriptor = descriptor.ok_or(HttpError::MissingPart("version"))?;
  let firmware = firmware.ok_or(HttpError::MissingPart("firmware"))?;

  state
    .authority
    .publish_firmware(&descriptor, byte_stream(firmware))
    .await?;
  Ok("OK")
}
