use std::sync::Arc;

use otaserve_artifact::FsStore;
use otaserve_authority::VersionAuthority;
use otaserve_config::ServerConfig;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::ServeError;
use crate::routes::create_router;

/// Serve the firmware directory named in `config` until `shutdown` fires.
pub async fn serve(config: &ServerConfig, shutdown: CancellationToken) -> Result<(), ServeError> {
  let store = FsStore::new(&config.firmware_dir);
  if config.create_dir {
    store.create_dir_all().await?;
  }
  let firmware_dir = store.root().display().to_string();
  let app = create_router(VersionAuthority::new(Arc::new(store)), config)?;

  let listener = TcpListener::bind(config.bind)
    .await
    .map_err(|source| ServeError::Bind {
      addr: config.bind,
      source,
    })?;
  info!(
    addr = %config.bind,
    firmware_dir = %firmware_dir,
    version_header = %config.version_header,
    "listening"
  );

  axum::serve(listener, app)
    .with_graceful_shutdown(async move { shutdown.cancelled().await })
    .await
    .map_err(ServeError::Io)?;

  info!("server stopped");
  Ok(())
}
