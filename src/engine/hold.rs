//! Hold-mode state machine
//!
//! The trigger acts as a dead-man switch: recording runs while the
//! combination stays satisfied and stops on key release or as soon as a
//! required modifier is lifted or a forbidden one is pressed.

use tracing::debug;

use crate::hotkey::RawEvent;

use super::{Combo, Decision, Notice, RecordingIntent};

/// Hold-mode arm state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Arm {
    #[default]
    Disarmed,
    Armed,
}

#[derive(Debug, Default)]
pub(super) struct HoldMachine {
    arm: Arm,
}

impl HoldMachine {
    pub(super) fn arm(&self) -> Arm {
        self.arm
    }

    pub(super) fn session_active(&self) -> bool {
        self.arm == Arm::Armed
    }

    pub(super) fn handle(&mut self, event: &RawEvent, combo: &Combo) -> Decision {
        match *event {
            RawEvent::KeyDown {
                key_code,
                held,
                repeat,
            } => {
                if key_code != combo.key_code {
                    return Decision::PASS;
                }
                if !combo.satisfied_by(held) {
                    return Decision::mismatch(held, repeat);
                }
                match self.arm {
                    Arm::Disarmed => {
                        self.arm = Arm::Armed;
                        debug!("hold hotkey armed");
                        Decision::CONSUME
                            .with_intent(RecordingIntent::Start)
                            .with_notice(Notice::RecordingStarted)
                    }
                    Arm::Armed => Decision::CONSUME,
                }
            }
            RawEvent::KeyUp { key_code, .. } => {
                if self.arm == Arm::Armed && key_code == combo.key_code {
                    self.arm = Arm::Disarmed;
                    debug!("hold hotkey released");
                    Decision::CONSUME
                        .with_intent(RecordingIntent::Stop)
                        .with_notice(Notice::RecordingStopped)
                } else {
                    Decision::PASS
                }
            }
            RawEvent::ModifierFlagsChanged { held } => {
                // Arming happens only on the trigger key-down
                if self.arm == Arm::Disarmed || combo.satisfied_by(held) {
                    return Decision::PASS;
                }
                self.arm = Arm::Disarmed;
                debug!(?held, "hold broken by modifier change");
                Decision::PASS
                    .with_intent(RecordingIntent::Stop)
                    .with_notice(Notice::HoldReleased { held })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotkey::{Modifier, ModifierSet};

    const KEY: u16 = 0x61;
    const OTHER: u16 = 0x62;

    fn combo() -> Combo {
        Combo {
            key_code: KEY,
            required: ModifierSet::from([Modifier::Command]),
            forbidden: ModifierSet::from([Modifier::Option]),
        }
    }

    fn cmd() -> ModifierSet {
        ModifierSet::from([Modifier::Command])
    }

    fn armed() -> HoldMachine {
        let mut machine = HoldMachine::default();
        let decision = machine.handle(&RawEvent::key_down(KEY, cmd()), &combo());
        assert_eq!(decision.intent, RecordingIntent::Start);
        machine
    }

    #[test]
    fn test_press_and_release() {
        let mut machine = armed();
        assert_eq!(machine.arm(), Arm::Armed);
        assert!(machine.session_active());

        let release = machine.handle(&RawEvent::key_up(KEY, cmd()), &combo());
        assert!(release.consumed);
        assert_eq!(release.intent, RecordingIntent::Stop);
        assert_eq!(release.notice, Some(Notice::RecordingStopped));
        assert_eq!(machine.arm(), Arm::Disarmed);
    }

    #[test]
    fn test_duplicate_press_does_not_restart() {
        let mut machine = armed();
        for event in [RawEvent::key_repeat(KEY, cmd()), RawEvent::key_down(KEY, cmd())] {
            let decision = machine.handle(&event, &combo());
            assert_eq!(decision, Decision::CONSUME);
        }
        assert_eq!(machine.arm(), Arm::Armed);
    }

    #[test]
    fn test_other_keys_pass_through() {
        let mut machine = armed();
        assert_eq!(
            machine.handle(&RawEvent::key_down(OTHER, cmd()), &combo()),
            Decision::PASS
        );
        assert_eq!(
            machine.handle(&RawEvent::key_up(OTHER, cmd()), &combo()),
            Decision::PASS
        );
        assert_eq!(machine.arm(), Arm::Armed);
    }

    #[test]
    fn test_key_up_while_disarmed_passes_through() {
        let mut machine = HoldMachine::default();
        assert_eq!(
            machine.handle(&RawEvent::key_up(KEY, cmd()), &combo()),
            Decision::PASS
        );
    }

    #[test]
    fn test_mismatched_press_does_not_arm() {
        let mut machine = HoldMachine::default();
        let decision = machine.handle(&RawEvent::key_down(KEY, ModifierSet::empty()), &combo());
        assert!(!decision.consumed);
        assert_eq!(
            decision.notice,
            Some(Notice::Mismatch {
                held: ModifierSet::empty()
            })
        );
        assert_eq!(machine.arm(), Arm::Disarmed);

        let repeat = machine.handle(&RawEvent::key_repeat(KEY, ModifierSet::empty()), &combo());
        assert_eq!(repeat, Decision::PASS);
    }

    #[test]
    fn test_flags_never_arm() {
        let mut machine = HoldMachine::default();
        let decision = machine.handle(&RawEvent::flags_changed(cmd()), &combo());
        assert_eq!(decision, Decision::PASS);
        assert_eq!(machine.arm(), Arm::Disarmed);
    }

    #[test]
    fn test_extra_allowed_modifier_keeps_hold() {
        let mut machine = armed();
        let held = cmd().with(Modifier::Shift);
        let decision = machine.handle(&RawEvent::flags_changed(held), &combo());
        assert_eq!(decision, Decision::PASS);
        assert_eq!(machine.arm(), Arm::Armed);
    }

    #[test]
    fn test_lifting_required_modifier_disarms() {
        let mut machine = armed();
        let decision = machine.handle(&RawEvent::flags_changed(ModifierSet::empty()), &combo());
        assert!(!decision.consumed);
        assert_eq!(decision.intent, RecordingIntent::Stop);
        assert_eq!(
            decision.notice,
            Some(Notice::HoldReleased {
                held: ModifierSet::empty()
            })
        );
        assert_eq!(machine.arm(), Arm::Disarmed);

        // The trailing release of the trigger key is no longer ours
        assert_eq!(
            machine.handle(&RawEvent::key_up(KEY, ModifierSet::empty()), &combo()),
            Decision::PASS
        );
    }

    #[test]
    fn test_pressing_forbidden_modifier_disarms() {
        let mut machine = armed();
        let held = cmd().with(Modifier::Option);
        let decision = machine.handle(&RawEvent::flags_changed(held), &combo());
        assert_eq!(decision.intent, RecordingIntent::Stop);
        assert_eq!(decision.notice, Some(Notice::HoldReleased { held }));
        assert_eq!(machine.arm(), Arm::Disarmed);
    }
}
