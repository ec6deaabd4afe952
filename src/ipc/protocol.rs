//! IPC message protocol definitions
//!
//! All messages are JSON-encoded, prefixed with a 4-byte little-endian length.

use std::time::UNIX_EPOCH;

use serde::{Deserialize, Serialize};

use crate::config::ActivationMode;
use crate::engine::{HotkeySnapshot, Validation};
use crate::events::StateEvent;

/// Largest frame accepted from a client
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Requests from UI to daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Request current daemon status
    GetStatus,

    /// Re-read the hotkey configuration and resume listening if allowed
    ReloadConfig,

    /// Start listening if the configuration allows it
    Resume,

    /// Stop listening
    Suspend,

    /// Ping to check connectivity
    Ping,

    /// Subscribe to state change notifications
    Subscribe,
}

/// Responses from daemon to UI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Current daemon status
    Status(DaemonStatus),

    /// Outcome of a configuration reload
    Reloaded {
        validation: ValidationReport,
        hotkey_active: bool,
    },

    /// Listening state after a resume or suspend
    Listening { active: bool },

    /// Pong response to ping
    Pong,

    /// Subscription confirmed
    Subscribed,

    /// Error response
    Error { code: String, message: String },
}

impl Response {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Response::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// Push notification from daemon to UI (for subscribed clients)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "event", rename_all = "snake_case")]
pub enum Notification {
    /// State event occurred
    StateEvent(StateEvent),
}

/// Serializable view of a validation outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// "valid", "warned" or "disabled"
    pub outcome: String,
    /// Warning or disable reason, if any
    pub detail: Option<String>,
}

impl From<&Validation> for ValidationReport {
    fn from(validation: &Validation) -> Self {
        let (outcome, detail) = match validation {
            Validation::Valid => ("valid", None),
            Validation::Warned(warning) => ("warned", Some(warning.to_string())),
            Validation::Disabled(reason) => ("disabled", Some(reason.to_string())),
        };
        Self {
            outcome: outcome.to_string(),
            detail,
        }
    }
}

/// Full daemon status snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonStatus {
    /// Daemon version
    pub version: String,

    /// Configured activation mode
    pub mode: ActivationMode,

    /// Rendered trigger combination, e.g. "Toggle · ⌘⇧Space"
    pub summary: String,

    /// Latest status message
    pub status_message: String,

    /// When the status message was rendered, in seconds since the Unix epoch
    pub status_updated_at: u64,

    pub validation: ValidationReport,

    /// Whether the interception facility is installed
    pub hotkey_active: bool,

    /// Whether a recording session is running
    pub recording: bool,

    /// Uptime in seconds
    pub uptime_secs: u64,
}

impl DaemonStatus {
    pub fn from_snapshot(snapshot: &HotkeySnapshot, recording: bool, uptime_secs: u64) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            mode: snapshot.mode,
            summary: snapshot.summary.clone(),
            status_message: snapshot.status_message.clone(),
            status_updated_at: snapshot
                .status_updated_at
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_secs())
                .unwrap_or_default(),
            validation: ValidationReport::from(&snapshot.validation),
            hotkey_active: snapshot.hotkey_active,
            recording,
            uptime_secs,
        }
    }
}
