//! Configuration loading and management

mod error;
mod hotkey;
mod source;

use std::path::PathBuf;

use anyhow::Result;

pub use error::ConfigError;
pub use hotkey::{ActivationMode, HotkeyConfig};
pub use source::{ConfigSource, FileConfigSource, MemoryConfigSource};

/// Environment variable overriding the hotkey configuration file
pub const HOTKEY_CONFIG_ENV: &str = "HOTKEY_DAEMON_CONFIG";

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Path to the Unix domain socket for IPC
    pub socket_path: PathBuf,

    /// Directory for runtime data
    pub data_dir: PathBuf,

    /// JSON file holding the hotkey configuration
    pub hotkey_config_path: PathBuf,
}

impl DaemonConfig {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        let home = std::env::var("HOME")?;
        let data_dir = PathBuf::from(&home)
            .join(".local")
            .join("share")
            .join("hotkey-daemon");

        let socket_path = data_dir.join("daemon.sock");
        let hotkey_config_path = std::env::var_os(HOTKEY_CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("hotkey.json"));

        Ok(Self {
            socket_path,
            data_dir,
            hotkey_config_path,
        })
    }

    /// Ensure data directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_load() {
        let config = DaemonConfig::load().unwrap();
        assert!(config.socket_path.to_string_lossy().contains("hotkey-daemon"));
        assert!(config.socket_path.starts_with(&config.data_dir));
    }
}
