//! Hotkey detection engine
//!
//! Classifies each raw keyboard event against the configured trigger
//! combination and decides whether it is swallowed and whether recording
//! should start or stop. Everything here is synchronous and allocation
//! is bounded per event; side effects are returned as intents for the
//! caller to dispatch.

mod controller;
mod hold;
mod status;
mod toggle;
mod validate;

use tracing::{debug, info, trace, warn};

use crate::config::{ActivationMode, HotkeyConfig};
use crate::hotkey::{KeyCanonicalizer, ModifierSet, RawEvent};

pub use controller::{HotkeyController, HotkeySnapshot};
pub use hold::Arm;
pub use status::{combo_summary, modifier_hint, StatusMessage, HOLD_RELEASED, NOT_TRIGGERED};
pub use toggle::Latch;
pub use validate::{validate, ConfigWarning, DisabledReason, Trigger, Validation};

use hold::HoldMachine;
use toggle::ToggleMachine;

/// Side effect requested from the recording subsystem
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecordingIntent {
    #[default]
    None,
    Start,
    Stop,
}

/// Something the user should be told about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// The trigger key was pressed with the wrong modifiers
    Mismatch { held: ModifierSet },
    /// A hold ended because the modifiers stopped matching
    HoldReleased { held: ModifierSet },
    RecordingStarted,
    RecordingStopped,
}

/// The outcome of processing one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Whether the event must be swallowed
    pub consumed: bool,
    pub intent: RecordingIntent,
    pub notice: Option<Notice>,
}

impl Decision {
    /// Let the event through, nothing else
    pub const PASS: Decision = Decision {
        consumed: false,
        intent: RecordingIntent::None,
        notice: None,
    };

    /// Swallow the event, nothing else
    pub const CONSUME: Decision = Decision {
        consumed: true,
        intent: RecordingIntent::None,
        notice: None,
    };

    pub fn with_intent(mut self, intent: RecordingIntent) -> Self {
        self.intent = intent;
        self
    }

    pub fn with_notice(mut self, notice: Notice) -> Self {
        self.notice = Some(notice);
        self
    }

    /// A trigger press with unsatisfied modifiers
    ///
    /// Auto-repeat presses stay silent so a held key does not flicker the
    /// status line.
    fn mismatch(held: ModifierSet, repeat: bool) -> Self {
        if repeat {
            Self::PASS
        } else {
            Self::PASS.with_notice(Notice::Mismatch { held })
        }
    }
}

/// A resolved trigger combination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Combo {
    pub key_code: u16,
    pub required: ModifierSet,
    pub forbidden: ModifierSet,
}

impl Combo {
    /// All required modifiers held and no forbidden modifier held
    pub fn satisfied_by(&self, held: ModifierSet) -> bool {
        self.required.is_subset(&held) && self.forbidden.intersection(held).is_empty()
    }
}

/// Observable state of the active mode's machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Toggle(Latch),
    Hold(Arm),
}

#[derive(Debug)]
enum Machine {
    Toggle(ToggleMachine),
    Hold(HoldMachine),
}

impl Machine {
    fn for_mode(mode: ActivationMode) -> Self {
        match mode {
            ActivationMode::Toggle => Machine::Toggle(ToggleMachine::default()),
            ActivationMode::Hold => Machine::Hold(HoldMachine::default()),
        }
    }

    fn session_active(&self) -> bool {
        match self {
            Machine::Toggle(machine) => machine.session_active(),
            Machine::Hold(machine) => machine.session_active(),
        }
    }
}

/// Result of applying a new configuration snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reload {
    pub validation: Validation,
    /// A recording session started by the previous snapshot was cut off
    pub interrupted_session: bool,
}

/// The per-event decision engine
///
/// Owns the configuration snapshot, the mode's state machine and the
/// latest status message.
pub struct HotkeyEngine {
    keys: Box<dyn KeyCanonicalizer>,
    config: HotkeyConfig,
    validation: Validation,
    combo: Option<Combo>,
    summary: String,
    machine: Machine,
    status: StatusMessage,
    /// A stop the recorder never received, retried with the next event
    pending_stop: bool,
}

impl HotkeyEngine {
    pub fn new(keys: Box<dyn KeyCanonicalizer>, config: HotkeyConfig) -> Self {
        let mut engine = Self {
            keys,
            validation: Validation::Disabled(DisabledReason::EmptyKey),
            combo: None,
            summary: String::new(),
            machine: Machine::for_mode(config.mode),
            status: StatusMessage::new(""),
            pending_stop: false,
            config,
        };
        engine.apply_config(engine.config.clone());
        engine
    }

    /// Replace the configuration snapshot and reset the state machine
    pub fn apply_config(&mut self, config: HotkeyConfig) -> Reload {
        let interrupted_session = self.reset();
        let summary = combo_summary(&config, self.keys.as_ref());

        let (validation, combo, message) = match validate(&config, self.keys.as_ref()) {
            Ok((trigger, warning)) => {
                let combo = Combo {
                    key_code: trigger.key_code,
                    required: config.required,
                    forbidden: config.forbidden,
                };
                match warning {
                    Some(warning) => {
                        warn!(%summary, %warning, "hotkey enabled with warning");
                        let message = status::warned_message(&summary, &warning);
                        (Validation::Warned(warning), Some(combo), message)
                    }
                    None => {
                        info!(%summary, key = %trigger.token, "hotkey enabled");
                        (Validation::Valid, Some(combo), status::ready_message(&summary))
                    }
                }
            }
            Err(reason) => {
                warn!(%summary, %reason, "hotkey disabled");
                let message = status::disabled_message(&reason);
                (Validation::Disabled(reason), None, message)
            }
        };

        self.machine = Machine::for_mode(config.mode);
        self.config = config;
        self.combo = combo;
        self.summary = summary;
        self.validation = validation.clone();
        self.status = StatusMessage::new(message);

        Reload {
            validation,
            interrupted_session,
        }
    }

    /// Process one event
    ///
    /// Disabled configurations let every event through untouched, apart
    /// from carrying a pending stop.
    pub fn handle(&mut self, event: &RawEvent) -> Decision {
        let mut decision = match self.combo {
            Some(combo) => self.decide(event, combo),
            None => Decision::PASS,
        };

        if std::mem::take(&mut self.pending_stop) && decision.intent == RecordingIntent::None {
            debug!("retrying dropped stop intent");
            decision.intent = RecordingIntent::Stop;
        }
        decision
    }

    fn decide(&mut self, event: &RawEvent, combo: Combo) -> Decision {
        let decision = match &mut self.machine {
            Machine::Toggle(machine) => machine.handle(event, &combo),
            Machine::Hold(machine) => machine.handle(event, &combo),
        };

        if let Some(notice) = decision.notice {
            self.status = StatusMessage::new(self.render(notice, &combo));
        }
        if decision.consumed || decision.intent != RecordingIntent::None {
            debug!(?event, ?decision, "hotkey event handled");
        } else {
            trace!(?event, "event passed through");
        }

        decision
    }

    /// Reconcile the state machine with an intent the recorder never got
    ///
    /// A lost toggle is undone so the next press repeats it. A lost stop
    /// in hold mode is retried with the next event.
    pub fn intent_dropped(&mut self, intent: RecordingIntent) {
        match &mut self.machine {
            Machine::Toggle(machine) => machine.intent_dropped(intent),
            Machine::Hold(_) => {
                if intent == RecordingIntent::Stop {
                    self.pending_stop = true;
                }
            }
        }
    }

    /// Put the state machine back in its initial state
    ///
    /// Returns whether a recording session was cut short.
    pub fn reset(&mut self) -> bool {
        let pending_stop = std::mem::take(&mut self.pending_stop);
        let interrupted = self.machine.session_active() || pending_stop;
        self.machine = Machine::for_mode(self.config.mode);
        interrupted
    }

    fn render(&self, notice: Notice, combo: &Combo) -> String {
        match notice {
            Notice::Mismatch { held } => {
                modifier_hint(NOT_TRIGGERED, combo.required, combo.forbidden, held)
            }
            Notice::HoldReleased { held } => {
                modifier_hint(HOLD_RELEASED, combo.required, combo.forbidden, held)
            }
            Notice::RecordingStarted => format!("Recording: {}", self.summary),
            Notice::RecordingStopped => "Recording stopped".to_string(),
        }
    }

    pub fn config(&self) -> &HotkeyConfig {
        &self.config
    }

    pub fn validation(&self) -> &Validation {
        &self.validation
    }

    pub fn status(&self) -> &StatusMessage {
        &self.status
    }

    /// Mode label, required modifiers and trigger key of the current snapshot
    pub fn combo_summary(&self) -> &str {
        &self.summary
    }

    pub fn state(&self) -> EngineState {
        match &self.machine {
            Machine::Toggle(machine) => EngineState::Toggle(machine.latch()),
            Machine::Hold(machine) => EngineState::Hold(machine.arm()),
        }
    }

    /// Whether the engine believes a recording session it started is running
    pub fn session_active(&self) -> bool {
        self.machine.session_active()
    }
}

impl std::fmt::Debug for HotkeyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HotkeyEngine")
            .field("config", &self.config)
            .field("validation", &self.validation)
            .field("state", &self.state())
            .field("status", &self.status.text())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotkey::{codes, MacKeyTable, Modifier};

    fn engine(config: HotkeyConfig) -> HotkeyEngine {
        HotkeyEngine::new(Box::new(MacKeyTable), config)
    }

    fn cmd_shift() -> ModifierSet {
        ModifierSet::from([Modifier::Command, Modifier::Shift])
    }

    #[test]
    fn test_toggle_scenario() {
        let mut engine = engine(
            HotkeyConfig::new("space", ActivationMode::Toggle)
                .requiring([Modifier::Command, Modifier::Shift]),
        );
        assert_eq!(engine.validation(), &Validation::Valid);
        assert_eq!(engine.state(), EngineState::Toggle(Latch::Idle));

        let press = RawEvent::key_down(codes::SPACE, cmd_shift());
        let first = engine.handle(&press);
        assert!(first.consumed);
        assert_eq!(first.intent, RecordingIntent::Start);
        assert_eq!(engine.status().text(), "Recording: Toggle · ⌘⇧Space");

        let again = engine.handle(&press);
        assert!(again.consumed);
        assert_eq!(again.intent, RecordingIntent::None);

        let release = engine.handle(&RawEvent::key_up(codes::SPACE, cmd_shift()));
        assert!(release.consumed);
        assert_eq!(engine.state(), EngineState::Toggle(Latch::Idle));

        let stop = engine.handle(&press);
        assert_eq!(stop.intent, RecordingIntent::Stop);
        assert_eq!(engine.status().text(), "Recording stopped");
    }

    #[test]
    fn test_hold_scenario_with_forbidden_modifier() {
        let mut engine = engine(
            HotkeyConfig::new("f6", ActivationMode::Hold)
                .requiring([Modifier::Command])
                .forbidding([Modifier::Option]),
        );

        let arm = engine.handle(&RawEvent::key_down(codes::F6, [Modifier::Command]));
        assert!(arm.consumed);
        assert_eq!(arm.intent, RecordingIntent::Start);
        assert_eq!(engine.state(), EngineState::Hold(Arm::Armed));

        let broken =
            engine.handle(&RawEvent::flags_changed([Modifier::Command, Modifier::Option]));
        assert_eq!(broken.intent, RecordingIntent::Stop);
        assert_eq!(engine.state(), EngineState::Hold(Arm::Disarmed));
        let text = engine.status().text();
        assert!(text.starts_with("Hold released"), "{text}");
        assert!(text.contains("forbidden"), "{text}");
        assert!(text.contains("⌥"), "{text}");
    }

    #[test]
    fn test_hold_missing_required_after_flags_cleared() {
        let mut engine = engine(
            HotkeyConfig::new("f6", ActivationMode::Hold).requiring([Modifier::Command]),
        );
        engine.handle(&RawEvent::key_down(codes::F6, [Modifier::Command]));

        let decision = engine.handle(&RawEvent::flags_changed(ModifierSet::empty()));
        assert_eq!(decision.intent, RecordingIntent::Stop);
        assert_eq!(engine.status().text(), "Hold released: missing required: ⌘");
    }

    #[test]
    fn test_repeat_mismatch_keeps_previous_hint() {
        let mut engine = engine(
            HotkeyConfig::new("space", ActivationMode::Toggle)
                .requiring([Modifier::Command, Modifier::Shift]),
        );

        let held = ModifierSet::from([Modifier::Command]);
        let decision = engine.handle(&RawEvent::key_down(codes::SPACE, held));
        assert!(!decision.consumed);
        let first = engine.status().clone();
        assert_eq!(
            first.text(),
            "Hotkey not triggered: missing required: ⇧ (held: ⌘)"
        );

        let repeat = engine.handle(&RawEvent::key_repeat(codes::SPACE, ModifierSet::empty()));
        assert!(!repeat.consumed);
        assert_eq!(engine.status(), &first);
    }

    #[test]
    fn test_disabled_config_passes_everything() {
        let mut engine = engine(HotkeyConfig::new("f99", ActivationMode::Toggle));
        assert!(matches!(
            engine.validation(),
            Validation::Disabled(DisabledReason::FunctionKeyOutOfRange(_))
        ));
        assert_eq!(
            engine.status().text(),
            "Hotkey disabled: function key 'f99' is outside F1-F24"
        );

        let status = engine.status().clone();
        for event in [
            RawEvent::key_down(codes::F6, ModifierSet::empty()),
            RawEvent::key_up(codes::F6, ModifierSet::empty()),
            RawEvent::flags_changed([Modifier::Command]),
        ] {
            assert_eq!(engine.handle(&event), Decision::PASS);
        }
        assert_eq!(engine.status(), &status);
    }

    #[test]
    fn test_warned_config_still_processes_events() {
        let mut engine = engine(HotkeyConfig::new("a", ActivationMode::Toggle));
        assert!(matches!(engine.validation(), Validation::Warned(_)));
        assert!(engine.status().text().contains("warning"));

        let decision = engine.handle(&RawEvent::key_down(codes::A, ModifierSet::empty()));
        assert!(decision.consumed);
        assert_eq!(decision.intent, RecordingIntent::Start);
    }

    #[test]
    fn test_reload_is_idempotent_and_resets_state() {
        let config = HotkeyConfig::new("space", ActivationMode::Toggle)
            .requiring([Modifier::Command, Modifier::Shift]);
        let mut engine = engine(config.clone());

        engine.handle(&RawEvent::key_down(codes::SPACE, cmd_shift()));
        assert_eq!(engine.state(), EngineState::Toggle(Latch::Consumed));

        let first = engine.apply_config(config.clone());
        assert_eq!(engine.state(), EngineState::Toggle(Latch::Idle));
        assert!(first.interrupted_session);

        let second = engine.apply_config(config);
        assert_eq!(engine.state(), EngineState::Toggle(Latch::Idle));
        assert_eq!(first.validation, second.validation);
        assert!(!second.interrupted_session);
    }

    #[test]
    fn test_mode_switch_starts_in_initial_state() {
        let mut engine = engine(
            HotkeyConfig::new("f6", ActivationMode::Hold).requiring([Modifier::Command]),
        );
        engine.handle(&RawEvent::key_down(codes::F6, [Modifier::Command]));
        assert_eq!(engine.state(), EngineState::Hold(Arm::Armed));

        let reload = engine.apply_config(HotkeyConfig::new("f6", ActivationMode::Toggle));
        assert!(reload.interrupted_session);
        assert_eq!(engine.state(), EngineState::Toggle(Latch::Idle));
        assert_eq!(engine.combo_summary(), "Toggle · F6");
    }

    #[test]
    fn test_conflicting_modifiers_disable() {
        let engine = engine(
            HotkeyConfig::new("f6", ActivationMode::Hold)
                .requiring([Modifier::Command])
                .forbidding([Modifier::Command]),
        );
        assert!(engine.validation().is_disabled());
        assert!(engine.status().text().contains("both required and forbidden"));
    }

    #[test]
    fn test_dropped_hold_stop_rides_on_next_event() {
        let mut engine = engine(HotkeyConfig::new("f6", ActivationMode::Hold));
        engine.handle(&RawEvent::key_down(codes::F6, ModifierSet::empty()));
        let stop = engine.handle(&RawEvent::key_up(codes::F6, ModifierSet::empty()));
        assert_eq!(stop.intent, RecordingIntent::Stop);

        engine.intent_dropped(stop.intent);
        let next = engine.handle(&RawEvent::key_down(codes::A, ModifierSet::empty()));
        assert!(!next.consumed);
        assert_eq!(next.intent, RecordingIntent::Stop);

        let after = engine.handle(&RawEvent::key_down(codes::A, ModifierSet::empty()));
        assert_eq!(after, Decision::PASS);
    }

    #[test]
    fn test_pending_stop_counts_as_interrupted_on_reload() {
        let mut engine = engine(HotkeyConfig::new("f6", ActivationMode::Hold));
        engine.handle(&RawEvent::key_down(codes::F6, ModifierSet::empty()));
        engine.handle(&RawEvent::key_up(codes::F6, ModifierSet::empty()));
        engine.intent_dropped(RecordingIntent::Stop);

        let reload = engine.apply_config(HotkeyConfig::new("f6", ActivationMode::Toggle));
        assert!(reload.interrupted_session);
        assert!(!engine.apply_config(engine.config().clone()).interrupted_session);
    }
}
