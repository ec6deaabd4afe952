//! Toggle-mode state machine
//!
//! The latch makes activation edge-triggered: only the Idle -> Consumed
//! transition toggles recording, so auto-repeat and duplicate key-downs
//! are absorbed until the trigger key is released.

use tracing::debug;

use crate::hotkey::RawEvent;

use super::{Combo, Decision, Notice, RecordingIntent};

/// Toggle-mode latch state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Latch {
    #[default]
    Idle,
    /// The current physical press already toggled recording
    Consumed,
}

#[derive(Debug, Default)]
pub(super) struct ToggleMachine {
    latch: Latch,
    /// Whether the last toggle started a recording session
    recording: bool,
}

impl ToggleMachine {
    pub(super) fn latch(&self) -> Latch {
        self.latch
    }

    pub(super) fn session_active(&self) -> bool {
        self.recording
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
                match self.latch {
                    Latch::Idle => {
                        self.latch = Latch::Consumed;
                        self.toggle()
                    }
                    Latch::Consumed => Decision::CONSUME,
                }
            }
            RawEvent::KeyUp { key_code, .. } => {
                // Only the key code gates release; modifiers may already be up
                if self.latch == Latch::Consumed && key_code == combo.key_code {
                    self.latch = Latch::Idle;
                    Decision::CONSUME
                } else {
                    Decision::PASS
                }
            }
            RawEvent::ModifierFlagsChanged { .. } => Decision::PASS,
        }
    }

    /// Undo the flip for an intent that never reached the recorder
    pub(super) fn intent_dropped(&mut self, intent: RecordingIntent) {
        match intent {
            RecordingIntent::Start => self.recording = false,
            RecordingIntent::Stop => self.recording = true,
            RecordingIntent::None => {}
        }
    }

    fn toggle(&mut self) -> Decision {
        self.recording = !self.recording;
        debug!(recording = self.recording, "toggle hotkey fired");
        if self.recording {
            Decision::CONSUME
                .with_intent(RecordingIntent::Start)
                .with_notice(Notice::RecordingStarted)
        } else {
            Decision::CONSUME
                .with_intent(RecordingIntent::Stop)
                .with_notice(Notice::RecordingStopped)
        }
    }
}
