//! Recording session tracking
//!
//! Consumes recording intents from the hotkey engine, keeps track of
//! whether a session is running and for how long, and broadcasts the
//! resulting state events.

use std::time::Instant;

use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info};

use crate::engine::{HotkeySnapshot, RecordingIntent};
use crate::events::StateEvent;

/// Tracks the recording session driven by hotkey intents
pub struct RecordingSession {
    /// Time when the current session started
    started_at: Option<Instant>,
    /// Engine snapshot, read for the activation mode
    snapshot_rx: watch::Receiver<HotkeySnapshot>,
    /// Channel for emitting state events
    event_tx: broadcast::Sender<StateEvent>,
}

impl RecordingSession {
    pub fn new(
        snapshot_rx: watch::Receiver<HotkeySnapshot>,
        event_tx: broadcast::Sender<StateEvent>,
    ) -> Self {
        Self {
            started_at: None,
            snapshot_rx,
            event_tx,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.started_at.is_some()
    }

    /// Run the session, processing intents until the channel closes
    pub async fn run(&mut self, mut intent_rx: mpsc::Receiver<RecordingIntent>) {
        info!("recording session started");

        while let Some(intent) = intent_rx.recv().await {
            self.apply(intent);
        }

        if self.is_recording() {
            self.apply(RecordingIntent::Stop);
        }
        info!("recording session stopped");
    }

    /// Apply one intent, ignoring ones that do not change anything
    fn apply(&mut self, intent: RecordingIntent) {
        let event = match (intent, self.started_at) {
            (RecordingIntent::Start, None) => {
                self.started_at = Some(Instant::now());
                let mode = self.snapshot_rx.borrow().mode;
                info!(%mode, "recording started");
                StateEvent::RecordingStarted { mode }
            }
            (RecordingIntent::Stop, Some(started_at)) => {
                self.started_at = None;
                let duration_ms = started_at.elapsed().as_millis() as u64;
                info!(duration_ms, "recording stopped");
                StateEvent::RecordingStopped { duration_ms }
            }
            (RecordingIntent::None, _) => return,
            (intent, _) => {
                debug!(?intent, recording = self.is_recording(), "redundant intent ignored");
                return;
            }
        };

        debug!(%event, "emitting recording event");
        let _ = self.event_tx.send(event);
    }
}
