//! Raw keyboard events delivered by the interception facility

use super::keys::ModifierSet;

/// A single keyboard event, already translated from the platform representation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawEvent {
    /// A key went down, or the keyboard auto-repeated a held key
    KeyDown {
        key_code: u16,
        held: ModifierSet,
        repeat: bool,
    },
    /// A key was released
    KeyUp { key_code: u16, held: ModifierSet },
    /// The set of held modifiers changed
    ModifierFlagsChanged { held: ModifierSet },
}

impl RawEvent {
    /// A fresh physical key press
    pub fn key_down(key_code: u16, held: impl Into<ModifierSet>) -> Self {
        Self::KeyDown {
            key_code,
            held: held.into(),
            repeat: false,
        }
    }

    /// A key press generated by keyboard auto-repeat
    pub fn key_repeat(key_code: u16, held: impl Into<ModifierSet>) -> Self {
        Self::KeyDown {
            key_code,
            held: held.into(),
            repeat: true,
        }
    }

    pub fn key_up(key_code: u16, held: impl Into<ModifierSet>) -> Self {
        Self::KeyUp {
            key_code,
            held: held.into(),
        }
    }

    pub fn flags_changed(held: impl Into<ModifierSet>) -> Self {
        Self::ModifierFlagsChanged { held: held.into() }
    }
}
