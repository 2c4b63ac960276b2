use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Runtime configuration for the server and the retention sweeper.
///
/// Values come from an optional TOML file merged over the built-in defaults;
/// CLI flags override both (see `main.rs`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Directory holding uploaded artifacts.
    pub upload_dir: PathBuf,
    /// Port the HTTP server listens on.
    pub port: u16,
    /// Seconds an artifact may sit unmodified before the sweep deletes it.
    pub retention_secs: u64,
    /// Seconds between retention sweeps.
    pub sweep_interval_secs: u64,
    /// Filename the sweep never deletes. Unset by default.
    pub exempt_file: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            port: 3001,
            retention_secs: 4 * 60 * 60,
            sweep_interval_secs: 60 * 60,
            exempt_file: None,
        }
    }
}

impl ServerConfig {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("tabledrop.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<ServerConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: ServerConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}
