//! Status message and combo summary rendering

use std::time::SystemTime;

use crate::config::HotkeyConfig;
use crate::hotkey::{KeyCanonicalizer, ModifierSet};

use super::validate::{ConfigWarning, DisabledReason};

/// Prefix for a near-miss key press
pub const NOT_TRIGGERED: &str = "Hotkey not triggered";
/// Prefix for a hold cut short by a modifier change
pub const HOLD_RELEASED: &str = "Hold released";

/// The latest user-facing status line
///
/// Each update overwrites the previous message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    text: String,
    updated_at: SystemTime,
}

impl StatusMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            updated_at: SystemTime::now(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn updated_at(&self) -> SystemTime {
        self.updated_at
    }
}

/// Explain why a combination did not match
///
/// Lists forbidden modifiers that were held, then required modifiers that
/// were missing, then everything that was held (omitted when nothing was).
pub fn modifier_hint(
    prefix: &str,
    required: ModifierSet,
    forbidden: ModifierSet,
    held: ModifierSet,
) -> String {
    let mut parts = Vec::with_capacity(2);

    let present_forbidden = forbidden.intersection(held);
    if !present_forbidden.is_empty() {
        parts.push(format!("forbidden: {}", present_forbidden.symbols()));
    }

    let missing = required.difference(held);
    if !missing.is_empty() {
        parts.push(format!("missing required: {}", missing.symbols()));
    }

    let mut text = String::from(prefix);
    if !parts.is_empty() {
        text.push_str(": ");
        text.push_str(&parts.join("; "));
    }
    if !held.is_empty() {
        text.push_str(&format!(" (held: {})", held.symbols()));
    }
    text
}

/// Mode label, required modifier symbols and trigger key, e.g. "Toggle · ⌘⇧Space"
pub fn combo_summary(config: &HotkeyConfig, keys: &dyn KeyCanonicalizer) -> String {
    let token = keys.canonical_key(&config.trigger_key);
    let key = if token.is_empty() {
        "(none)".to_string()
    } else {
        keys.display_key(&token)
    };
    format!("{} · {}{}", config.mode.label(), config.required.symbols(), key)
}

pub fn ready_message(summary: &str) -> String {
    format!("Hotkey ready: {summary}")
}

pub fn warned_message(summary: &str, warning: &ConfigWarning) -> String {
    format!("Hotkey ready: {summary} (warning: {warning})")
}

pub fn disabled_message(reason: &DisabledReason) -> String {
    format!("Hotkey disabled: {reason}")
}
