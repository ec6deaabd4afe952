//! Lifecycle control surface around the engine
//!
//! `HotkeyController` is constructed once and handed to the interception
//! facility and the IPC layer. The interception callback calls `handle`;
//! everything it needs to tell other subsystems leaves through channels
//! so the callback never calls into them directly.
//!
//! Lock order is `lifecycle` before `engine`. Intents and status updates
//! are sent while the engine lock is held; both are non-blocking.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info, warn};

use crate::config::{ActivationMode, ConfigError, ConfigSource};
use crate::events::StateEvent;
use crate::hotkey::{EventInterceptor, HotkeyError, RawEvent};

use super::{HotkeyEngine, RecordingIntent, StatusMessage, Validation};

/// Read-only view of the engine for observers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeySnapshot {
    pub summary: String,
    pub status_message: String,
    /// When the status message was rendered
    pub status_updated_at: SystemTime,
    pub mode: ActivationMode,
    pub validation: Validation,
    /// Whether the interception facility is installed
    pub hotkey_active: bool,
}

impl HotkeySnapshot {
    fn of(engine: &HotkeyEngine, hotkey_active: bool) -> Self {
        Self {
            summary: engine.combo_summary().to_string(),
            status_message: engine.status().text().to_string(),
            status_updated_at: engine.status().updated_at(),
            mode: engine.config().mode,
            validation: engine.validation().clone(),
            hotkey_active,
        }
    }
}

struct Inner {
    engine: Mutex<HotkeyEngine>,
    /// Serializes resume, suspend and listener loss
    lifecycle: Mutex<()>,
    source: Box<dyn ConfigSource>,
    interceptor: Box<dyn EventInterceptor>,
    intent_tx: mpsc::Sender<RecordingIntent>,
    event_tx: broadcast::Sender<StateEvent>,
    snapshot_tx: watch::Sender<HotkeySnapshot>,
}

/// Shared handle to the hotkey engine and its lifecycle
#[derive(Clone)]
pub struct HotkeyController {
    inner: Arc<Inner>,
}

impl HotkeyController {
    pub fn new(
        engine: HotkeyEngine,
        source: Box<dyn ConfigSource>,
        interceptor: Box<dyn EventInterceptor>,
        intent_tx: mpsc::Sender<RecordingIntent>,
        event_tx: broadcast::Sender<StateEvent>,
    ) -> Self {
        let snapshot = HotkeySnapshot::of(&engine, interceptor.is_installed());
        let (snapshot_tx, _) = watch::channel(snapshot);

        Self {
            inner: Arc::new(Inner {
                engine: Mutex::new(engine),
                lifecycle: Mutex::new(()),
                source,
                interceptor,
                intent_tx,
                event_tx,
                snapshot_tx,
            }),
        }
    }

    /// Process one event from the interception facility
    ///
    /// Returns whether the event must be swallowed.
    pub fn handle(&self, event: RawEvent) -> bool {
        let mut engine = self.engine();
        let decision = engine.handle(&event);

        self.dispatch(&mut engine, decision.intent);
        if decision.notice.is_some() {
            self.publish_status(engine.status());
        }

        decision.consumed
    }

    /// Load a fresh snapshot from the config source and reset the engine
    ///
    /// The source is read before the engine lock is taken; the snapshot
    /// swap, state reset and resulting notifications happen under a
    /// single lock.
    pub fn reload_config(&self) -> Result<Validation, ConfigError> {
        let config = self.inner.source.load()?;

        let validation = {
            let mut engine = self.engine();
            let reload = engine.apply_config(config);

            if reload.interrupted_session {
                info!("configuration reload interrupted an active recording");
                self.dispatch(&mut engine, RecordingIntent::Stop);
            }

            self.refresh_snapshot(&engine);
            let _ = self.inner.event_tx.send(StateEvent::ConfigReloaded {
                summary: engine.combo_summary().to_string(),
                enabled: reload.validation.allows_listening(),
            });
            reload.validation
        };

        if validation.is_disabled() && self.is_hotkey_active() {
            info!("new configuration is disabled, suspending listener");
            self.suspend();
        }

        Ok(validation)
    }

    /// Install the interception facility unless the configuration is disabled
    ///
    /// Returns whether the hotkey is listening afterwards.
    pub fn resume_if_possible(&self) -> Result<bool, HotkeyError> {
        let _guard = self.lifecycle();

        let validation = self.engine().validation().clone();
        if let Validation::Disabled(reason) = &validation {
            info!(%reason, "hotkey disabled, not listening");
            return Ok(false);
        }

        if self.inner.interceptor.is_installed() {
            debug!("hotkey listener already installed");
            return Ok(true);
        }

        self.inner.interceptor.install(self.clone())?;
        info!("hotkey listener installed");
        self.listening_changed(true);
        Ok(true)
    }

    /// Remove the interception facility if it is installed
    pub fn suspend(&self) {
        let _guard = self.lifecycle();

        if !self.inner.interceptor.is_installed() {
            return;
        }
        self.inner.interceptor.uninstall();
        info!("hotkey listener removed");
        self.listening_changed(false);
    }

    /// The interception facility stopped on its own
    ///
    /// Called by the interceptor after it has torn itself down. Any
    /// session in progress is stopped since its release will never be seen.
    pub fn interception_lost(&self) {
        let _guard = self.lifecycle();
        warn!("hotkey listener lost, keyboard events are no longer intercepted");

        {
            let mut engine = self.engine();
            if engine.reset() {
                info!("listener loss interrupted an active recording");
                self.dispatch(&mut engine, RecordingIntent::Stop);
            }
        }
        self.listening_changed(false);
    }

    pub fn configured_combo_summary(&self) -> String {
        self.inner.snapshot_tx.borrow().summary.clone()
    }

    pub fn status_message(&self) -> String {
        self.inner.snapshot_tx.borrow().status_message.clone()
    }

    pub fn is_hotkey_active(&self) -> bool {
        self.inner.interceptor.is_installed()
    }

    pub fn snapshot(&self) -> HotkeySnapshot {
        self.inner.snapshot_tx.borrow().clone()
    }

    /// Observe snapshot changes
    pub fn subscribe(&self) -> watch::Receiver<HotkeySnapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    fn engine(&self) -> MutexGuard<'_, HotkeyEngine> {
        self.inner
            .engine
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lifecycle(&self) -> MutexGuard<'_, ()> {
        self.inner
            .lifecycle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Hand an intent to the recording subsystem without blocking
    ///
    /// An intent that cannot be queued is handed back to the engine so its
    /// idea of the session matches the recorder's.
    fn dispatch(&self, engine: &mut HotkeyEngine, intent: RecordingIntent) {
        if intent == RecordingIntent::None {
            return;
        }
        match self.inner.intent_tx.try_send(intent) {
            Ok(()) => {
                debug!(?intent, "recording intent dispatched");
                return;
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(?intent, "recording intent queue full, intent dropped")
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!(?intent, "recording controller gone, intent dropped")
            }
        }
        engine.intent_dropped(intent);
    }

    fn publish_status(&self, status: &StatusMessage) {
        self.inner.snapshot_tx.send_modify(|snapshot| {
            snapshot.status_message = status.text().to_string();
            snapshot.status_updated_at = status.updated_at();
        });
        let _ = self.inner.event_tx.send(StateEvent::StatusChanged {
            message: status.text().to_string(),
        });
    }

    fn listening_changed(&self, active: bool) {
        self.inner
            .snapshot_tx
            .send_modify(|snapshot| snapshot.hotkey_active = active);
        let _ = self.inner.event_tx.send(StateEvent::ListeningChanged { active });
    }

    fn refresh_snapshot(&self, engine: &HotkeyEngine) {
        let snapshot = HotkeySnapshot::of(engine, self.inner.interceptor.is_installed());
        let message = snapshot.status_message.clone();
        self.inner.snapshot_tx.send_replace(snapshot);
        let _ = self.inner.event_tx.send(StateEvent::StatusChanged { message });
    }
}

impl std::fmt::Debug for HotkeyController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HotkeyController")
            .field("snapshot", &*self.inner.snapshot_tx.borrow())
            .finish()
    }
}
