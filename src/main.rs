use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use otaserve_artifact::{FsStore, Store, byte_stream};
use otaserve_authority::{UpdateDecision, VersionAuthority};
use otaserve_config::ServerConfig;

/// otaserve - over-the-air firmware updates for embedded devices
#[derive(Parser)]
#[command(name = "otaserve")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to a JSON config file (default: ~/.otaserve/config.json if present)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Directory holding firmware artifacts (overrides the config file)
  #[arg(long, global = true)]
  firmware_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Run the update server
  Serve {
    /// Address to listen on (overrides the config file)
    #[arg(long)]
    bind: Option<SocketAddr>,
  },

  /// Publish a firmware binary into the firmware directory
  Publish {
    /// Text file declaring FIRMWARE_VERSION "X.Y.Z"
    #[arg(long)]
    descriptor: PathBuf,

    /// The firmware binary
    #[arg(long)]
    firmware: PathBuf,
  },

  /// List stored firmware versions
  Versions,

  /// Show the decision a device running VERSION would get
  Check {
    /// The version the device reports
    version: String,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .init();

  let mut config = load_config(cli.config.as_deref())?;
  if let Some(firmware_dir) = cli.firmware_dir {
    config.firmware_dir = firmware_dir;
  }

  let rt = tokio::runtime::Runtime::new()?;
  match cli.command {
    Some(Commands::Serve { bind }) => {
      if let Some(bind) = bind {
        config.bind = bind;
      }
      rt.block_on(run_server(config))?;
    }
    Some(Commands::Publish {
      descriptor,
      firmware,
    }) => {
      rt.block_on(publish(config, descriptor, firmware))?;
    }
    Some(Commands::Versions) => {
      rt.block_on(list_versions(config))?;
    }
    Some(Commands::Check { version }) => {
      rt.block_on(check(config, version))?;
    }
    None => {
      println!("otaserve - use --help to see available commands");
    }
  }

  Ok(())
}

fn load_config(explicit: Option<&Path>) -> Result<ServerConfig> {
  if let Some(path) = explicit {
    return ServerConfig::load(path).context("failed to load config");
  }

  let default_path = dirs::home_dir().map(|home| home.join(".otaserve").join("config.json"));
  match default_path {
    Some(path) if path.exists() => ServerConfig::load(&path).context("failed to load config"),
    _ => Ok(ServerConfig::default()),
  }
}

fn authority(config: &ServerConfig) -> VersionAuthority<FsStore> {
  VersionAuthority::new(Arc::new(FsStore::new(&config.firmware_dir)))
}

async fn run_server(config: ServerConfig) -> Result<()> {
  let cancel = CancellationToken::new();

  let shutdown = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      info!("shutdown requested");
      shutdown.cancel();
    }
  });

  otaserve_http::serve(&config, cancel)
    .await
    .context("server failed")
}

async fn publish(config: ServerConfig, descriptor: PathBuf, firmware: PathBuf) -> Result<()> {
  let descriptor_content = tokio::fs::read(&descriptor)
    .await
    .with_context(|| format!("failed to read descriptor: {}", descriptor.display()))?;
  let firmware_content = tokio::fs::read(&firmware)
    .await
    .with_context(|| format!("failed to read firmware: {}", firmware.display()))?;

  let authority = authority(&config);
  if config.create_dir {
    authority
      .store()
      .create_dir_all()
      .await
      .context("failed to create firmware directory")?;
  }

  let version = authority
    .publish_firmware(&descriptor_content, byte_stream(firmware_content))
    .await
    .context("failed to publish firmware")?;

  println!("{version}");
  Ok(())
}

async fn list_versions(config: ServerConfig) -> Result<()> {
  let versions = authority(&config)
    .store()
    .list_versions()
    .await
    .context("failed to list firmware versions")?;

  let latest = versions.last().cloned();
  for version in versions {
    if Some(&version) == latest.as_ref() {
      println!("{version} (latest)");
    } else {
      println!("{version}");
    }
  }

  Ok(())
}

async fn check(config: ServerConfig, version: String) -> Result<()> {
  let decision = authority(&config)
    .check_for_update(Some(&version))
    .await
    .context("update check failed")?;

  match decision {
    UpdateDecision::NoUpdate(reason) => println!("{reason}"),
    UpdateDecision::UpdateAvailable(artifact) => {
      println!(
        "Update available: {version} -> {} ({} bytes)",
        artifact.version, artifact.size
      );
    }
  }

  Ok(())
}
