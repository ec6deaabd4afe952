//! Hotkey configuration snapshot

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::hotkey::{Modifier, ModifierSet};

/// How the trigger combination controls recording
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationMode {
    /// One press starts recording, the next press stops it
    #[default]
    Toggle,
    /// Recording runs only while the combination is held
    #[serde(alias = "hold_to_talk", alias = "push_to_talk")]
    Hold,
}

impl ActivationMode {
    pub fn label(self) -> &'static str {
        match self {
            ActivationMode::Toggle => "Toggle",
            ActivationMode::Hold => "Hold to talk",
        }
    }
}

impl fmt::Display for ActivationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An immutable hotkey configuration snapshot
///
/// A reload replaces the whole snapshot; it is never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotkeyConfig {
    /// Raw trigger key name, canonicalized during validation
    pub trigger_key: String,
    pub mode: ActivationMode,
    /// Modifiers that must all be held
    pub required: ModifierSet,
    /// Modifiers that must not be held
    pub forbidden: ModifierSet,
}

impl HotkeyConfig {
    pub fn new(trigger_key: impl Into<String>, mode: ActivationMode) -> Self {
        Self {
            trigger_key: trigger_key.into(),
            mode,
            required: ModifierSet::empty(),
            forbidden: ModifierSet::empty(),
        }
    }

    pub fn requiring(mut self, required: impl Into<ModifierSet>) -> Self {
        self.required = required.into();
        self
    }

    pub fn forbidding(mut self, forbidden: impl Into<ModifierSet>) -> Self {
        self.forbidden = forbidden.into();
        self
    }
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self::new("space", ActivationMode::Toggle).requiring([Modifier::Option])
    }
}
