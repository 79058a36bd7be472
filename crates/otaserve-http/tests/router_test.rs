//! Request-level tests for the otaserve router.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, Bytes, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use otaserve_artifact::{Artifact, ByteStream, Error, FsStore, Store, byte_stream};
use otaserve_authority::VersionAuthority;
use otaserve_config::ServerConfig;
use otaserve_http::{FIRMWARE_VERSION_HEADER, REASON_HEADER, ServeError, create_router};
use otaserve_version::Version;
use tower::ServiceExt;

const BOUNDARY: &str = "otaserve-test-boundary";

fn create_app(config: &ServerConfig) -> (Router, Arc<FsStore>, tempfile::TempDir) {
  let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
  let store = Arc::new(FsStore::new(temp_dir.path()));
  let router = create_router(VersionAuthority::new(Arc::clone(&store)), config).unwrap();
  (router, store, temp_dir)
}

async fn seed(store: &FsStore, version: &str, content: &'static [u8]) {
  store.publish(version, byte_stream(content)).await.unwrap();
}

fn check_request(version: Option<&str>) -> Request<Body> {
  let mut builder = Request::builder().method("GET").uri("/update");
  if let Some(version) = version {
    builder = builder.header("x-esp8266-version", version);
  }
  builder.body(Body::empty()).unwrap()
}

/// Build a multipart/form-data body from (name, filename, content) parts.
fn multipart_request(parts: &[(&str, &str, &[u8])]) -> Request<Body> {
  let mut body = Vec::new();
  for (name, filename, content) in parts {
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
      format!(
        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n"
      )
      .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(b"\r\n");
  }
  body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

  Request::builder()
    .method("POST")
    .uri("/firmware")
    .header(
      header::CONTENT_TYPE,
      format!("multipart/form-data; boundary={BOUNDARY}"),
    )
    .body(Body::from(body))
    .unwrap()
}

async fn body_bytes(response: Response) -> Bytes {
  to_bytes(response.into_body(), usize::MAX).await.unwrap()
}

async fn body_text(response: Response) -> String {
  String::from_utf8(body_bytes(response).await.to_vec()).unwrap()
}

#[tokio::test]
async fn test_check_serves_latest_firmware() {
  let (app, store, _temp_dir) = create_app(&ServerConfig::default());
  seed(&store, "1.0.0", b"old image").await;
  seed(&store, "1.2.0", b"new image").await;

  let response = app.oneshot(check_request(Some("1.1.0"))).await.unwrap();
  assert_eq!(response.status(), StatusCode::OK);
  assert_eq!(
    response.headers()[header::CONTENT_TYPE],
    "application/octet-stream"
  );
  assert_eq!(response.headers()[header::CONTENT_LENGTH], "9");
  assert_eq!(response.headers()[FIRMWARE_VERSION_HEADER], "1.2.0");
  assert_eq!(body_bytes(response).await, Bytes::from_static(b"new image"));
}

#[tokio::test]
async fn test_check_current_device_gets_not_modified() {
  let (app, store, _temp_dir) = create_app(&ServerConfig::default());
  seed(&store, "1.2.0", b"image").await;

  let response = app.oneshot(check_request(Some("1.2.0"))).await.unwrap();
  assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
  assert_eq!(
    response.headers()[REASON_HEADER],
    "No update available: 1.2.0 >= 1.2.0"
  );
}

#[tokio::test]
async fn test_check_without_header_gets_not_modified() {
  let (app, store, _temp_dir) = create_app(&ServerConfig::default());
  seed(&store, "1.2.0", b"image").await;

  let response = app.oneshot(check_request(None)).await.unwrap();
  assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
}

#[tokio::test]
async fn test_check_custom_version_header() {
  let config = ServerConfig {
    version_header: "x-firmware-current".to_string(),
    ..ServerConfig::default()
  };
  let (app, store, _temp_dir) = create_app(&config);
  seed(&store, "2.0.0", b"image").await;

  let request = Request::builder()
    .uri("/update")
    .header("x-firmware-current", "1.0.0")
    .body(Body::empty())
    .unwrap();
  let response = app.oneshot(request).await.unwrap();
  assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_check_empty_store_is_not_found() {
  let (app, _store, _temp_dir) = create_app(&ServerConfig::default());

  let response = app.oneshot(check_request(Some("1.0.0"))).await.unwrap();
  assert_eq!(response.status(), StatusCode::NOT_FOUND);
  assert_eq!(body_text(response).await, "no firmware available");
}

#[tokio::test]
async fn test_check_missing_store_directory_is_server_error() {
  let temp_dir = tempfile::tempdir().unwrap();
  let store = FsStore::new(temp_dir.path().join("gone"));
  let app = create_router(VersionAuthority::new(Arc::new(store)), &ServerConfig::default()).unwrap();

  let response = app.oneshot(check_request(Some("1.0.0"))).await.unwrap();
  assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
  assert!(body_text(response).await.starts_with("artifact store unavailable"));
}

/// A store whose artifacts disappear between listing and opening.
struct VanishingStore;

#[async_trait]
impl Store for VanishingStore {
  async fn list_versions(&self) -> Result<BTreeSet<Version>, Error> {
    Ok(BTreeSet::from([Version::new(9, 9, 9)]))
  }

  async fn open(&self, version: &Version) -> Result<Artifact, Error> {
    Err(Error::NotFound(version.to_string()))
  }

  async fn publish(&self, _version: &str, _data: ByteStream) -> Result<Version, Error> {
    unreachable!("not used")
  }
}

#[tokio::test]
async fn test_check_artifact_vanished_is_conflict() {
  let app = create_router(
    VersionAuthority::new(Arc::new(VanishingStore)),
    &ServerConfig::default(),
  )
  .unwrap();

  let response = app.oneshot(check_request(Some("1.0.0"))).await.unwrap();
  assert_eq!(response.status(), StatusCode::CONFLICT);
  assert_eq!(body_text(response).await, "artifact not found: 9.9.9");
}

#[tokio::test]
async fn test_publish_then_check() {
  let (app, store, _temp_dir) = create_app(&ServerConfig::default());

  let response = app
    .clone()
    .oneshot(multipart_request(&[
      ("version", "version.h", b"#define FIRMWARE_VERSION \"2.0.1\"\n"),
      ("firmware", "firmware.bin", b"\x00\x01binary\xff"),
    ]))
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::OK);
  assert_eq!(body_text(response).await, "OK");

  let versions = store.list_versions().await.unwrap();
  assert_eq!(versions.len(), 1);
  assert_eq!(versions.first().unwrap().to_string(), "2.0.1");

  let response = app.oneshot(check_request(Some("2.0.0"))).await.unwrap();
  assert_eq!(response.status(), StatusCode::OK);
  assert_eq!(body_bytes(response).await, Bytes::from_static(b"\x00\x01binary\xff"));
}

#[tokio::test]
async fn test_publish_missing_part() {
  let (app, _store, _temp_dir) = create_app(&ServerConfig::default());

  let response = app
    .oneshot(multipart_request(&[(
      "version",
      "version.h",
      b"#define FIRMWARE_VERSION \"1.0.0\"",
    )]))
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::BAD_REQUEST);
  assert_eq!(body_text(response).await, "missing 'firmware' part");
}

#[tokio::test]
async fn test_publish_malformed_descriptor() {
  let (app, store, _temp_dir) = create_app(&ServerConfig::default());

  let response = app
    .oneshot(multipart_request(&[
      ("version", "version.h", b"#define BOARD \"d1_mini\""),
      ("firmware", "firmware.bin", b"image"),
    ]))
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
  assert!(store.list_versions().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_publish_invalid_version() {
  let (app, _store, _temp_dir) = create_app(&ServerConfig::default());

  let response = app
    .oneshot(multipart_request(&[
      ("version", "version.h", b"#define FIRMWARE_VERSION \"1.0\""),
      ("firmware", "firmware.bin", b"image"),
    ]))
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_publish_empty_firmware() {
  let (app, store, _temp_dir) = create_app(&ServerConfig::default());

  let response = app
    .oneshot(multipart_request(&[
      ("version", "version.h", b"#define FIRMWARE_VERSION \"1.0.0\""),
      ("firmware", "firmware.bin", b""),
    ]))
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::BAD_REQUEST);
  assert_eq!(body_text(response).await, "firmware binary is empty");
  assert!(store.list_versions().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_publish_parts_in_any_order() {
  let (app, store, _temp_dir) = create_app(&ServerConfig::default());

  let response = app
    .oneshot(multipart_request(&[
      ("firmware", "firmware.bin", b"image"),
      ("version", "version.h", b"#define FIRMWARE_VERSION \"1.4.0\""),
    ]))
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::OK);
  assert!(store.list_versions().await.unwrap().contains(&Version::new(1, 4, 0)));
}

#[tokio::test]
async fn test_publish_broken_multipart_is_bad_request() {
  let (app, store, _temp_dir) = create_app(&ServerConfig::default());

  let request = Request::builder()
    .method("POST")
    .uri("/firmware")
    .header(
      header::CONTENT_TYPE,
      format!("multipart/form-data; boundary={BOUNDARY}"),
    )
    .body(Body::from(
      "--some-other-boundary\r\nContent-Disposition: form-data; name=\"version\"\r\n\r\n1.0.0",
    ))
    .unwrap();

  let response = app.oneshot(request).await.unwrap();
  assert_eq!(response.status(), StatusCode::BAD_REQUEST);
  assert!(store.list_versions().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_publish_over_limit_is_payload_too_large() {
  let config = ServerConfig {
    max_upload_bytes: 64,
    ..ServerConfig::default()
  };
  let (app, store, _temp_dir) = create_app(&config);
  let big = vec![0xAAu8; 1024];

  let response = app
    .oneshot(multipart_request(&[
      ("version", "version.h", b"#define FIRMWARE_VERSION \"1.0.0\""),
      ("firmware", "firmware.bin", &big),
    ]))
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
  assert!(store.list_versions().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_health() {
  let (app, _store, _temp_dir) = create_app(&ServerConfig::default());

  let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
  let response = app.oneshot(request).await.unwrap();
  assert_eq!(response.status(), StatusCode::OK);
  assert!(body_text(response).await.contains("\"status\":\"ok\""));
}

#[test]
fn test_invalid_header_name_rejected() {
  let temp_dir = tempfile::tempdir().unwrap();
  let config = ServerConfig {
    version_header: "not a header".to_string(),
    ..ServerConfig::default()
  };
  let authority = VersionAuthority::new(Arc::new(FsStore::new(temp_dir.path())));
  let err = create_router(authority, &config).unwrap_err();
  assert!(matches!(err, ServeError::InvalidHeader { .. }));
}
