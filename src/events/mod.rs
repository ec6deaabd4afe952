//! Events module for daemon notifications
//!
//! Structured events broadcast to the IPC layer and any other
//! subscriber when recording, status or listening state changes.

use serde::{Deserialize, Serialize};

use crate::config::ActivationMode;

/// Events emitted as the hotkey engine and recording session change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateEvent {
    /// Recording began after a hotkey activation
    RecordingStarted {
        /// Activation mode that started the session
        mode: ActivationMode,
    },

    /// Recording ended
    RecordingStopped {
        /// Duration in milliseconds that recording was active
        duration_ms: u64,
    },

    /// The status message changed
    StatusChanged { message: String },

    /// The interception facility was installed or removed
    ListeningChanged { active: bool },

    /// A new configuration snapshot was applied
    ConfigReloaded {
        summary: String,
        /// Whether the new configuration may listen
        enabled: bool,
    },
}

impl std::fmt::Display for StateEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateEvent::RecordingStarted { mode } => write!(f, "RECORDING_STARTED ({mode})"),
            StateEvent::RecordingStopped { duration_ms } => {
                write!(f, "RECORDING_STOPPED ({}ms)", duration_ms)
            }
            StateEvent::StatusChanged { message } => write!(f, "STATUS_CHANGED ({message})"),
            StateEvent::ListeningChanged { active } => {
                write!(f, "LISTENING_CHANGED ({})", if *active { "on" } else { "off" })
            }
            StateEvent::ConfigReloaded { summary, enabled } => {
                write!(
                    f,
                    "CONFIG_RELOADED ({summary}, {})",
                    if *enabled { "enabled" } else { "disabled" }
                )
            }
        }
    }
}
