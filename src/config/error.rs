use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a hotkey configuration snapshot
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read hotkey config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse hotkey config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
