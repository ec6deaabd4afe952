//! Key-name canonicalization
//!
//! Maps user-facing key names onto canonical tokens, virtual key codes
//! and display labels. The engine only talks to the `KeyCanonicalizer`
//! trait; `MacKeyTable` is the table for macOS virtual key codes.

/// Canonical key-name lookups used by validation and event matching
pub trait KeyCanonicalizer: Send + Sync {
    /// Normalize a raw key name into its canonical token
    fn canonical_key(&self, raw: &str) -> String;

    /// Whether the canonical token names a key that can be matched
    fn is_supported_key(&self, token: &str) -> bool {
        self.key_code(token).is_some()
    }

    /// Human-readable label for a canonical token
    fn display_key(&self, token: &str) -> String;

    /// Virtual key code for a canonical token
    fn key_code(&self, token: &str) -> Option<u16>;

    /// Whether the token names a modifier key rather than a triggerable key
    fn is_modifier_key(&self, token: &str) -> bool;

    /// Whether the token names a key used for ordinary typing
    fn is_typing_key(&self, token: &str) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyClass {
    Typing,
    Action,
    Modifier,
}

struct KeyEntry {
    token: &'static str,
    code: u16,
    label: &'static str,
    class: KeyClass,
}

const fn typing(token: &'static str, code: u16, label: &'static str) -> KeyEntry {
    KeyEntry {
        token,
        code,
        label,
        class: KeyClass::Typing,
    }
}

const fn action(token: &'static str, code: u16, label: &'static str) -> KeyEntry {
    KeyEntry {
        token,
        code,
        label,
        class: KeyClass::Action,
    }
}

const fn modifier(token: &'static str, code: u16, label: &'static str) -> KeyEntry {
    KeyEntry {
        token,
        code,
        label,
        class: KeyClass::Modifier,
    }
}

/// macOS ANSI virtual key codes (HIToolbox `kVK_*`)
const KEYS: &[KeyEntry] = &[
    typing("a", 0x00, "A"),
    typing("s", 0x01, "S"),
    typing("d", 0x02, "D"),
    typing("f", 0x03, "F"),
    typing("h", 0x04, "H"),
    typing("g", 0x05, "G"),
    typing("z", 0x06, "Z"),
    typing("x", 0x07, "X"),
    typing("c", 0x08, "C"),
    typing("v", 0x09, "V"),
    typing("b", 0x0B, "B"),
    typing("q", 0x0C, "Q"),
    typing("w", 0x0D, "W"),
    typing("e", 0x0E, "E"),
    typing("r", 0x0F, "R"),
    typing("y", 0x10, "Y"),
    typing("t", 0x11, "T"),
    typing("1", 0x12, "1"),
    typing("2", 0x13, "2"),
    typing("3", 0x14, "3"),
    typing("4", 0x15, "4"),
    typing("6", 0x16, "6"),
    typing("5", 0x17, "5"),
    typing("=", 0x18, "="),
    typing("9", 0x19, "9"),
    typing("7", 0x1A, "7"),
    typing("-", 0x1B, "-"),
    typing("8", 0x1C, "8"),
    typing("0", 0x1D, "0"),
    typing("]", 0x1E, "]"),
    typing("o", 0x1F, "O"),
    typing("u", 0x20, "U"),
    typing("[", 0x21, "["),
    typing("i", 0x22, "I"),
    typing("p", 0x23, "P"),
    action("return", 0x24, "Return"),
    typing("l", 0x25, "L"),
    typing("j", 0x26, "J"),
    typing("'", 0x27, "'"),
    typing("k", 0x28, "K"),
    typing(";", 0x29, ";"),
    typing("\\", 0x2A, "\\"),
    typing(",", 0x2B, ","),
    typing("/", 0x2C, "/"),
    typing("n", 0x2D, "N"),
    typing("m", 0x2E, "M"),
    typing(".", 0x2F, "."),
    action("tab", 0x30, "Tab"),
    typing("space", 0x31, "Space"),
    typing("`", 0x32, "`"),
    action("delete", 0x33, "Delete"),
    action("escape", 0x35, "Esc"),
    modifier("command", 0x37, "Command"),
    modifier("shift", 0x38, "Shift"),
    modifier("caps_lock", 0x39, "Caps Lock"),
    modifier("option", 0x3A, "Option"),
    modifier("control", 0x3B, "Control"),
    modifier("fn", 0x3F, "Fn"),
    action("f17", 0x40, "F17"),
    action("f18", 0x4F, "F18"),
    action("f19", 0x50, "F19"),
    action("f20", 0x5A, "F20"),
    action("f5", 0x60, "F5"),
    action("f6", 0x61, "F6"),
    action("f7", 0x62, "F7"),
    action("f3", 0x63, "F3"),
    action("f8", 0x64, "F8"),
    action("f9", 0x65, "F9"),
    action("f11", 0x67, "F11"),
    action("f13", 0x69, "F13"),
    action("f16", 0x6A, "F16"),
    action("f14", 0x6B, "F14"),
    action("f10", 0x6D, "F10"),
    action("f12", 0x6F, "F12"),
    action("f15", 0x71, "F15"),
    action("help", 0x72, "Help"),
    action("home", 0x73, "Home"),
    action("page_up", 0x74, "Page Up"),
    action("forward_delete", 0x75, "Forward Delete"),
    action("f4", 0x76, "F4"),
    action("end", 0x77, "End"),
    action("f2", 0x78, "F2"),
    action("page_down", 0x79, "Page Down"),
    action("f1", 0x7A, "F1"),
    action("left_arrow", 0x7B, "←"),
    action("right_arrow", 0x7C, "→"),
    action("down_arrow", 0x7D, "↓"),
    action("up_arrow", 0x7E, "↑"),
];

const ALIASES: &[(&str, &str)] = &[
    ("cmd", "command"),
    ("⌘", "command"),
    ("meta", "command"),
    ("super", "command"),
    ("⇧", "shift"),
    ("alt", "option"),
    ("opt", "option"),
    ("⌥", "option"),
    ("ctrl", "control"),
    ("⌃", "control"),
    ("capslock", "caps_lock"),
    ("caps", "caps_lock"),
    ("⇪", "caps_lock"),
    ("function", "fn"),
    ("spacebar", "space"),
    ("enter", "return"),
    ("esc", "escape"),
    ("backspace", "delete"),
    ("del", "forward_delete"),
    ("pageup", "page_up"),
    ("pagedown", "page_down"),
    ("left", "left_arrow"),
    ("right", "right_arrow"),
    ("up", "up_arrow"),
    ("down", "down_arrow"),
];

/// Key table for macOS virtual key codes
#[derive(Debug, Clone, Copy, Default)]
pub struct MacKeyTable;

impl MacKeyTable {
    fn entry(token: &str) -> Option<&'static KeyEntry> {
        KEYS.iter().find(|entry| entry.token == token)
    }
}

impl KeyCanonicalizer for MacKeyTable {
    fn canonical_key(&self, raw: &str) -> String {
        let lowered = raw.trim().to_lowercase().replace([' ', '-'], "_");
        // "-" alone is the minus key, not a separator
        let lowered = if raw.trim() == "-" { "-".to_string() } else { lowered };

        ALIASES
            .iter()
            .find(|(alias, _)| *alias == lowered)
            .map(|(_, token)| (*token).to_string())
            .unwrap_or(lowered)
    }

    fn display_key(&self, token: &str) -> String {
        match Self::entry(token) {
            Some(entry) => entry.label.to_string(),
            None => token.to_uppercase(),
        }
    }

    fn key_code(&self, token: &str) -> Option<u16> {
        Self::entry(token).map(|entry| entry.code)
    }

    fn is_modifier_key(&self, token: &str) -> bool {
        Self::entry(token).is_some_and(|entry| entry.class == KeyClass::Modifier)
    }

    fn is_typing_key(&self, token: &str) -> bool {
        Self::entry(token).is_some_and(|entry| entry.class == KeyClass::Typing)
    }
}

/// Virtual key codes referenced outside the table
pub mod codes {
    pub const A: u16 = 0x00;
    pub const SPACE: u16 = 0x31;
    pub const ESCAPE: u16 = 0x35;
    pub const F6: u16 = 0x61;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_key_normalizes_case_and_whitespace() {
        let table = MacKeyTable;
        assert_eq!(table.canonical_key("  F6 "), "f6");
        assert_eq!(table.canonical_key("Space"), "space");
        assert_eq!(table.canonical_key("A"), "a");
        assert_eq!(table.canonical_key("-"), "-");
    }

    #[test]
    fn test_canonical_key_resolves_aliases() {
        let table = MacKeyTable;
        assert_eq!(table.canonical_key("cmd"), "command");
        assert_eq!(table.canonical_key("⌥"), "option");
        assert_eq!(table.canonical_key("Caps Lock"), "caps_lock");
        assert_eq!(table.canonical_key("esc"), "escape");
        assert_eq!(table.canonical_key("Page-Up"), "page_up");
        assert_eq!(table.canonical_key("left"), "left_arrow");
    }

    #[test]
    fn test_key_codes() {
        let table = MacKeyTable;
        assert_eq!(table.key_code("space"), Some(codes::SPACE));
        assert_eq!(table.key_code("f6"), Some(codes::F6));
        assert_eq!(table.key_code("a"), Some(codes::A));
        assert_eq!(table.key_code("escape"), Some(codes::ESCAPE));
        assert_eq!(table.key_code("f21"), None);
        assert_eq!(table.key_code("banana"), None);
    }

    #[test]
    fn test_every_function_key_up_to_f20_is_supported() {
        let table = MacKeyTable;
        for n in 1..=20 {
            let token = format!("f{n}");
            assert!(table.is_supported_key(&token), "{token} should be supported");
        }
    }

    #[test]
    fn test_key_codes_are_unique() {
        for (i, a) in KEYS.iter().enumerate() {
            for b in &KEYS[i + 1..] {
                assert_ne!(a.code, b.code, "{} and {} share a code", a.token, b.token);
                assert_ne!(a.token, b.token);
            }
        }
    }

    #[test]
    fn test_key_classes() {
        let table = MacKeyTable;
        assert!(table.is_modifier_key("command"));
        assert!(table.is_modifier_key("fn"));
        assert!(!table.is_modifier_key("space"));

        assert!(table.is_typing_key("a"));
        assert!(table.is_typing_key("7"));
        assert!(table.is_typing_key("space"));
        assert!(!table.is_typing_key("f6"));
        assert!(!table.is_typing_key("escape"));
    }

    #[test]
    fn test_display_key() {
        let table = MacKeyTable;
        assert_eq!(table.display_key("space"), "Space");
        assert_eq!(table.display_key("f6"), "F6");
        assert_eq!(table.display_key("q"), "Q");
        assert_eq!(table.display_key("f99"), "F99");
    }
}
