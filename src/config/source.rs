//! Sources that supply hotkey configuration snapshots on demand

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use tracing::{debug, info};

use super::error::ConfigError;
use super::hotkey::HotkeyConfig;

/// Supplies a fresh configuration snapshot on each reload
pub trait ConfigSource: Send + Sync {
    fn load(&self) -> Result<HotkeyConfig, ConfigError>;
}

/// Reads the hotkey configuration from a JSON file
///
/// A missing file is not an error: the default configuration is used.
#[derive(Debug, Clone)]
pub struct FileConfigSource {
    path: PathBuf,
}

impl FileConfigSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for FileConfigSource {
    fn load(&self) -> Result<HotkeyConfig, ConfigError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = ?self.path, "no hotkey config file, using defaults");
                return Ok(HotkeyConfig::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let config = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = ?self.path, ?config, "hotkey config loaded");
        Ok(config)
    }
}

/// Holds a configuration snapshot in memory
#[derive(Debug, Default)]
pub struct MemoryConfigSource {
    config: RwLock<HotkeyConfig>,
}

impl MemoryConfigSource {
    pub fn new(config: HotkeyConfig) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }

    /// Replace the snapshot returned by the next `load`
    pub fn set(&self, config: HotkeyConfig) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
    }
}

impl ConfigSource for MemoryConfigSource {
    fn load(&self) -> Result<HotkeyConfig, ConfigError> {
        Ok(self
            .config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ActivationMode;
    use crate::hotkey::Modifier;

    #[test]
    fn test_missing_file_yields_default() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileConfigSource::new(dir.path().join("hotkey.json"));
        assert_eq!(source.path(), dir.path().join("hotkey.json"));
        assert_eq!(source.load().unwrap(), HotkeyConfig::default());
    }

    #[test]
    fn test_file_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hotkey.json");
        std::fs::write(
            &path,
            r#"{"trigger_key": "F6", "mode": "hold", "required": ["command"]}"#,
        )
        .unwrap();

        let config = FileConfigSource::new(&path).load().unwrap();
        assert_eq!(config.trigger_key, "F6");
        assert_eq!(config.mode, ActivationMode::Hold);
        assert!(config.required.contains(Modifier::Command));
    }

    #[test]
    fn test_malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hotkey.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = FileConfigSource::new(&path).load().unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("hotkey.json"));
    }

    #[test]
    fn test_directory_path_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileConfigSource::new(dir.path()).load().unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_memory_source_replacement() {
        let source = MemoryConfigSource::new(HotkeyConfig::default());
        source.set(HotkeyConfig::new("f6", ActivationMode::Hold));
        assert_eq!(source.load().unwrap().trigger_key, "f6");
    }
}
