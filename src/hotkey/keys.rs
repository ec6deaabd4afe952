//! Modifier key definitions and modifier sets
//!
//! The engine works on a small closed `Modifier` set. Platform flag masks
//! are translated at the boundary and never reach the state machines.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Modifier flag masks as reported in macOS event flags
pub mod flags {
    /// Caps Lock (AlphaShift) modifier flag
    pub const CAPS_LOCK: u64 = 0x0001_0000;
    /// Shift key modifier flag
    pub const SHIFT: u64 = 0x0002_0000;
    /// Control key modifier flag
    pub const CONTROL: u64 = 0x0004_0000;
    /// Option/Alt key modifier flag
    pub const OPTION: u64 = 0x0008_0000;
    /// Command key modifier flag
    pub const COMMAND: u64 = 0x0010_0000;
}

/// A single modifier key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    #[serde(alias = "cmd")]
    Command,
    Shift,
    #[serde(alias = "alt", alias = "opt")]
    Option,
    #[serde(alias = "ctrl")]
    Control,
    #[serde(alias = "capslock", alias = "caps")]
    CapsLock,
}

impl Modifier {
    /// All modifiers in canonical display order
    pub const ALL: [Modifier; 5] = [
        Modifier::Command,
        Modifier::Shift,
        Modifier::Option,
        Modifier::Control,
        Modifier::CapsLock,
    ];

    /// The symbol used in summaries and hints
    pub fn symbol(self) -> &'static str {
        match self {
            Modifier::Command => "⌘",
            Modifier::Shift => "⇧",
            Modifier::Option => "⌥",
            Modifier::Control => "⌃",
            Modifier::CapsLock => "⇪",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Modifier::Command => "command",
            Modifier::Shift => "shift",
            Modifier::Option => "option",
            Modifier::Control => "control",
            Modifier::CapsLock => "caps_lock",
        }
    }

    fn bit(self) -> u8 {
        match self {
            Modifier::Command => 1 << 0,
            Modifier::Shift => 1 << 1,
            Modifier::Option => 1 << 2,
            Modifier::Control => 1 << 3,
            Modifier::CapsLock => 1 << 4,
        }
    }

    fn event_flag(self) -> u64 {
        match self {
            Modifier::Command => flags::COMMAND,
            Modifier::Shift => flags::SHIFT,
            Modifier::Option => flags::OPTION,
            Modifier::Control => flags::CONTROL,
            Modifier::CapsLock => flags::CAPS_LOCK,
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// An unordered set of modifiers
///
/// Membership is the only meaningful property; iteration always yields
/// the canonical order (command, shift, option, control, caps lock).
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Modifier>", into = "Vec<Modifier>")]
pub struct ModifierSet(u8);

impl ModifierSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Build a set from the host platform's event flag bitmask
    ///
    /// Bits that do not correspond to a tracked modifier are ignored.
    pub fn from_event_flags(bits: u64) -> Self {
        Modifier::ALL
            .into_iter()
            .filter(|m| bits & m.event_flag() != 0)
            .collect()
    }

    /// Build a set from macOS CGEventFlags
    #[cfg(target_os = "macos")]
    pub fn from_cg_flags(flags: core_graphics::event::CGEventFlags) -> Self {
        Self::from_event_flags(flags.bits())
    }

    pub fn insert(&mut self, modifier: Modifier) {
        self.0 |= modifier.bit();
    }

    pub fn remove(&mut self, modifier: Modifier) {
        self.0 &= !modifier.bit();
    }

    pub fn with(mut self, modifier: Modifier) -> Self {
        self.insert(modifier);
        self
    }

    pub fn contains(&self, modifier: Modifier) -> bool {
        self.0 & modifier.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Modifiers in `self` that are not in `other`
    pub fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        self.0 & !other.0 == 0
    }

    /// Iterate in canonical order
    pub fn iter(&self) -> impl Iterator<Item = Modifier> {
        let set = *self;
        Modifier::ALL.into_iter().filter(move |m| set.contains(*m))
    }

    /// Concatenated symbols in canonical order, e.g. "⌘⇧"
    pub fn symbols(&self) -> String {
        self.iter().map(Modifier::symbol).collect()
    }
}

impl FromIterator<Modifier> for ModifierSet {
    fn from_iter<I: IntoIterator<Item = Modifier>>(iter: I) -> Self {
        let mut set = Self::empty();
        for modifier in iter {
            set.insert(modifier);
        }
        set
    }
}

impl<const N: usize> From<[Modifier; N]> for ModifierSet {
    fn from(modifiers: [Modifier; N]) -> Self {
        modifiers.into_iter().collect()
    }
}

impl From<Vec<Modifier>> for ModifierSet {
    fn from(modifiers: Vec<Modifier>) -> Self {
        modifiers.into_iter().collect()
    }
}

impl From<ModifierSet> for Vec<Modifier> {
    fn from(set: ModifierSet) -> Self {
        set.iter().collect()
    }
}

impl fmt::Debug for ModifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
