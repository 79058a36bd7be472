use std::path::PathBuf;

/// Errors loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("failed to read config file {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse config file {}: {source}", path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
}
