//! Configuration validation
//!
//! Classifies a configuration snapshot as enabled, enabled with a
//! warning, or disabled with a reason.

use thiserror::Error;

use crate::config::HotkeyConfig;
use crate::hotkey::{KeyCanonicalizer, ModifierSet};

/// Highest function key number accepted in a trigger token
const MAX_FUNCTION_KEY: u32 = 24;

/// Why a configuration cannot be activated
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisabledReason {
    #[error("no trigger key configured")]
    EmptyKey,

    #[error("'{0}' is a modifier and cannot be the trigger key")]
    ModifierOnlyKey(String),

    #[error("function key '{0}' is outside F1-F24")]
    FunctionKeyOutOfRange(String),

    #[error("unsupported key '{0}'")]
    UnsupportedKey(String),

    #[error("{} both required and forbidden", .0.symbols())]
    ConflictingModifiers(ModifierSet),
}

/// Advisory annotations on an otherwise valid configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigWarning {
    #[error("'{0}' has no required modifier and will fire on every press")]
    UnsafeModifierConfiguration(String),
}

/// Result of validating a configuration snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid,
    Warned(ConfigWarning),
    Disabled(DisabledReason),
}

impl Validation {
    /// Whether the interception facility may be installed
    pub fn allows_listening(&self) -> bool {
        !matches!(self, Validation::Disabled(_))
    }

    pub fn is_disabled(&self) -> bool {
        !self.allows_listening()
    }
}

/// The resolved trigger key of an enabled configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    /// Canonical key token
    pub token: String,
    pub key_code: u16,
}

/// Validate a configuration against the key table
///
/// Checks run in a fixed order and the first failure wins.
pub fn validate(
    config: &HotkeyConfig,
    keys: &dyn KeyCanonicalizer,
) -> Result<(Trigger, Option<ConfigWarning>), DisabledReason> {
    if config.trigger_key.trim().is_empty() {
        return Err(DisabledReason::EmptyKey);
    }

    let token = keys.canonical_key(&config.trigger_key);

    if keys.is_modifier_key(&token) {
        return Err(DisabledReason::ModifierOnlyKey(token));
    }

    if let Some(n) = function_key_number(&token) {
        if !(1..=MAX_FUNCTION_KEY).contains(&n) {
            return Err(DisabledReason::FunctionKeyOutOfRange(token));
        }
    }

    let Some(key_code) = keys.key_code(&token) else {
        return Err(DisabledReason::UnsupportedKey(token));
    };

    let overlap = config.required.intersection(config.forbidden);
    if !overlap.is_empty() {
        return Err(DisabledReason::ConflictingModifiers(overlap));
    }

    let warning = (keys.is_typing_key(&token) && config.required.is_empty())
        .then(|| ConfigWarning::UnsafeModifierConfiguration(keys.display_key(&token)));

    Ok((Trigger { token, key_code }, warning))
}

/// Numeric suffix of an `f<digits>` token
///
/// Suffixes too large for `u32` still count as function keys.
fn function_key_number(token: &str) -> Option<u32> {
    let digits = token.strip_prefix('f')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(digits.parse().unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ActivationMode;
    use crate::hotkey::{codes, MacKeyTable, Modifier};

    fn check(config: &HotkeyConfig) -> Validation {
        match validate(config, &MacKeyTable) {
            Ok((_, Some(warning))) => Validation::Warned(warning),
            Ok((_, None)) => Validation::Valid,
            Err(reason) => Validation::Disabled(reason),
        }
    }

    fn toggle(key: &str) -> HotkeyConfig {
        HotkeyConfig::new(key, ActivationMode::Toggle)
    }

    #[test]
    fn test_empty_and_whitespace_keys() {
        for key in ["", " ", "\t  "] {
            assert_eq!(
                check(&toggle(key).requiring([Modifier::Command])),
                Validation::Disabled(DisabledReason::EmptyKey)
            );
        }
    }

    #[test]
    fn test_modifier_only_keys() {
        for key in ["command", "cmd", "Shift", "⌥", "ctrl", "caps lock", "fn"] {
            let result = check(&toggle(key));
            assert!(
                matches!(result, Validation::Disabled(DisabledReason::ModifierOnlyKey(_))),
                "{key}: {result:?}"
            );
        }
    }

    #[test]
    fn test_function_key_range() {
        for key in ["f0", "F25", "f99", "f123456789012"] {
            let result = check(&toggle(key));
            assert!(
                matches!(result, Validation::Disabled(DisabledReason::FunctionKeyOutOfRange(_))),
                "{key}: {result:?}"
            );
        }

        assert_eq!(check(&toggle("f1")), Validation::Valid);
        assert_eq!(check(&toggle("F20")), Validation::Valid);
        // In range but absent from the key table
        assert_eq!(
            check(&toggle("f24")),
            Validation::Disabled(DisabledReason::UnsupportedKey("f24".to_string()))
        );
    }

    #[test]
    fn test_unsupported_key() {
        assert_eq!(
            check(&toggle("banana")),
            Validation::Disabled(DisabledReason::UnsupportedKey("banana".to_string()))
        );
    }

    #[test]
    fn test_plain_key_without_required_modifier_warns() {
        for key in ["a", "Q", "7", "space", "/"] {
            let result = check(&toggle(key));
            assert!(
                matches!(
                    result,
                    Validation::Warned(ConfigWarning::UnsafeModifierConfiguration(_))
                ),
                "{key}: {result:?}"
            );
            assert!(result.allows_listening());
        }
    }

    #[test]
    fn test_forbidden_modifiers_do_not_silence_the_warning() {
        let config = toggle("a").forbidding([Modifier::Command]);
        assert!(matches!(check(&config), Validation::Warned(_)));
    }

    #[test]
    fn test_action_key_without_modifiers_is_valid() {
        assert_eq!(check(&toggle("f6")), Validation::Valid);
        assert_eq!(check(&toggle("escape")), Validation::Valid);
    }

    #[test]
    fn test_plain_key_with_required_modifier_is_valid() {
        let config = toggle("space").requiring([Modifier::Command, Modifier::Shift]);
        assert_eq!(check(&config), Validation::Valid);
    }

    #[test]
    fn test_overlapping_required_and_forbidden_disables() {
        let config = toggle("f6")
            .requiring([Modifier::Command, Modifier::Shift])
            .forbidding([Modifier::Shift, Modifier::Option]);
        let result = check(&config);
        assert_eq!(
            result,
            Validation::Disabled(DisabledReason::ConflictingModifiers(ModifierSet::from([
                Modifier::Shift
            ])))
        );
        assert!(result.is_disabled());
    }

    #[test]
    fn test_resolved_trigger() {
        let (trigger, warning) =
            validate(&toggle(" F6 ").requiring([Modifier::Command]), &MacKeyTable).unwrap();
        assert_eq!(trigger.token, "f6");
        assert_eq!(trigger.key_code, codes::F6);
        assert!(warning.is_none());
    }

    #[test]
    fn test_reason_messages() {
        assert_eq!(DisabledReason::EmptyKey.to_string(), "no trigger key configured");
        assert_eq!(
            DisabledReason::FunctionKeyOutOfRange("f99".into()).to_string(),
            "function key 'f99' is outside F1-F24"
        );
        assert_eq!(
            DisabledReason::ConflictingModifiers(ModifierSet::from([Modifier::Option]))
                .to_string(),
            "⌥ both required and forbidden"
        );
    }
}
