//! walkbridge configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::dispatch::DispatchConfig;
use crate::transport::socket::default_socket_path;

/// Main walkbridge configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Dispatch queue settings
    pub dispatch: DispatchConfig,

    /// Socket transport settings
    pub transport: TransportConfig,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .walkbridge.yml
        let local_config = PathBuf::from(".walkbridge.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/walkbridge/walkbridge.yml
        if let Some(user_config) = user_config_path()
            && user_config.exists()
        {
            match Self::load_from_file(&user_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read just the log level, before logging is set up
    ///
    /// Errors are swallowed; the full [`Config::load`] reports them once
    /// logging works.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates: Vec<PathBuf> = match config_path {
            Some(path) => vec![path.clone()],
            None => std::iter::once(PathBuf::from(".walkbridge.yml"))
                .chain(user_config_path())
                .collect(),
        };

        candidates
            .iter()
            .find(|path| path.exists())
            .and_then(|path| fs::read_to_string(path).ok())
            .and_then(|content| serde_yaml::from_str::<Config>(&content).ok())
            .and_then(|config| config.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("walkbridge").join("walkbridge.yml"))
}

/// Socket transport configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Socket this endpoint listens on
    #[serde(rename = "socket-path")]
    pub socket_path: PathBuf,

    /// Peer sockets events are sent to
    pub peers: Vec<PathBuf>,

    /// Largest accepted frame, in bytes
    #[serde(rename = "max-frame-bytes")]
    pub max_frame_bytes: usize,

    /// Per-node send timeout in milliseconds
    #[serde(rename = "send-timeout-ms")]
    pub send_timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        let handheld = default_socket_path("handheld");
        Self {
            socket_path: handheld.clone(),
            peers: vec![handheld],
            max_frame_bytes: 64 * 1024,
            send_timeout_ms: 5000,
        }
    }
}

impl TransportConfig {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.log_level.is_none());
        assert_eq!(config.dispatch.pending_warn_threshold, 1000);
        assert_eq!(config.transport.max_frame_bytes, 65536);
        assert_eq!(config.transport.send_timeout(), Duration::from_secs(5));
        assert!(config.transport.socket_path.ends_with("walkbridge/handheld.sock"));
        assert_eq!(config.transport.peers, vec![config.transport.socket_path.clone()]);
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
log-level: debug

dispatch:
  pending-warn-threshold: 50

transport:
  socket-path: /run/walk/phone.sock
  peers:
    - /run/walk/watch.sock
    - /run/walk/tablet.sock
  max-frame-bytes: 4096
  send-timeout-ms: 250
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.dispatch.pending_warn_threshold, 50);
        assert_eq!(config.transport.socket_path, PathBuf::from("/run/walk/phone.sock"));
        assert_eq!(config.transport.peers.len(), 2);
        assert_eq!(config.transport.max_frame_bytes, 4096);
        assert_eq!(config.transport.send_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
transport:
  send-timeout-ms: 100
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.transport.send_timeout_ms, 100);
        assert_eq!(config.transport.max_frame_bytes, 65536);
        assert_eq!(config.dispatch, DispatchConfig::default());
    }

    #[test]
    fn test_load_explicit_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("walkbridge.yml");
        fs::write(&path, "log-level: warn\ndispatch:\n  pending-warn-threshold: 3\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.dispatch.pending_warn_threshold, 3);
        assert_eq!(Config::load_log_level(Some(&path)).as_deref(), Some("warn"));
    }

    #[test]
    fn test_load_explicit_path_errors() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing.yml");
        assert!(Config::load(Some(&missing)).is_err());
        assert!(Config::load_log_level(Some(&missing)).is_none());

        let broken = temp.path().join("broken.yml");
        fs::write(&broken, "dispatch: [not, a, map]").unwrap();
        assert!(Config::load(Some(&broken)).is_err());
    }
}
