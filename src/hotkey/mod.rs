//! Hotkey module for global keyboard event interception
//!
//! Holds the platform-neutral event and modifier types, the key-name
//! table, and the macOS CGEventTap listener that feeds the engine.

mod canonical;
mod event;
mod keys;
mod listener;

pub use canonical::{codes, KeyCanonicalizer, MacKeyTable};
pub use event::RawEvent;
pub use keys::{flags, Modifier, ModifierSet};
pub use listener::{EventInterceptor, HotkeyError, HotkeyListener};
