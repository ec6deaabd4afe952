//! Global hotkey listener using macOS CGEventTap
//!
//! Intercepts system-wide key-down, key-up and modifier-change events,
//! hands each one to the controller and swallows the ones it consumes.
//! Runs on a dedicated thread with its own CFRunLoop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::engine::HotkeyController;

use super::event::RawEvent;
use super::keys::ModifierSet;

/// Installs and removes the system-level event interception
pub trait EventInterceptor: Send + Sync {
    /// Start delivering events to `controller`
    fn install(&self, controller: HotkeyController) -> Result<(), HotkeyError>;

    /// Stop delivering events
    fn uninstall(&self);

    fn is_installed(&self) -> bool;
}

/// Errors that can occur in the hotkey listener
#[derive(Debug, thiserror::Error)]
pub enum HotkeyError {
    #[error("failed to create event tap - check Accessibility permissions")]
    EventTapCreation,

    #[error("failed to spawn listener thread: {0}")]
    ThreadSpawn(String),

    #[error("listener thread exited before reporting readiness")]
    ListenerExited,

    #[error("global key interception is not supported on this platform")]
    Unsupported,
}

/// Which kind of keyboard event the tap delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TapEvent {
    KeyDown,
    KeyUp,
    FlagsChanged,
}

/// Translate the raw fields of a tapped event into a `RawEvent`
pub(crate) fn translate(
    kind: TapEvent,
    key_code: i64,
    held: ModifierSet,
    autorepeat: i64,
) -> RawEvent {
    let key_code = u16::try_from(key_code).unwrap_or(u16::MAX);
    match kind {
        TapEvent::KeyDown => RawEvent::KeyDown {
            key_code,
            held,
            repeat: autorepeat != 0,
        },
        TapEvent::KeyUp => RawEvent::KeyUp { key_code, held },
        TapEvent::FlagsChanged => RawEvent::ModifierFlagsChanged { held },
    }
}

/// Global hotkey listener backed by a CGEventTap
#[derive(Debug, Default)]
pub struct HotkeyListener {
    running: Arc<AtomicBool>,
}

impl HotkeyListener {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventInterceptor for HotkeyListener {
    /// Spawn the listener thread and wait until the tap is live
    fn install(&self, controller: HotkeyController) -> Result<(), HotkeyError> {
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("hotkey listener already running");
            return Ok(());
        }

        let result = platform::spawn(controller, Arc::clone(&self.running));
        if result.is_err() {
            self.running.store(false, Ordering::SeqCst);
        }
        result
    }

    fn uninstall(&self) {
        // The run loop notices on its next wake-up and tears the tap down
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_installed(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

#[cfg(target_os = "macos")]
mod platform {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc as std_mpsc;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use core_foundation::runloop::{kCFRunLoopCommonModes, kCFRunLoopDefaultMode, CFRunLoop};
    use core_graphics::event::{
        CGEvent, CGEventTap, CGEventTapLocation, CGEventTapOptions, CGEventTapPlacement,
        CGEventTapProxy, CGEventType, EventField,
    };
    use tracing::{error, info, warn};

    use super::{translate, HotkeyError, TapEvent};
    use crate::engine::HotkeyController;
    use crate::hotkey::ModifierSet;

    /// How long install waits for the tap to come up
    const READY_TIMEOUT: Duration = Duration::from_secs(2);

    pub(super) fn spawn(
        controller: HotkeyController,
        running: Arc<AtomicBool>,
    ) -> Result<(), HotkeyError> {
        let (ready_tx, ready_rx) = std_mpsc::channel::<Result<(), HotkeyError>>();
        let thread_running = Arc::clone(&running);

        thread::Builder::new()
            .name("hotkey-listener".to_string())
            .spawn(move || {
                info!("hotkey listener thread started");
                run_event_loop(controller, Arc::clone(&thread_running), ready_tx);
                thread_running.store(false, Ordering::SeqCst);
                info!("hotkey listener thread stopped");
            })
            .map_err(|e| HotkeyError::ThreadSpawn(e.to_string()))?;

        match ready_rx.recv_timeout(READY_TIMEOUT) {
            Ok(result) => result,
            Err(_) => {
                running.store(false, Ordering::SeqCst);
                Err(HotkeyError::ListenerExited)
            }
        }
    }

    /// Run the CFRunLoop with the event tap until `running` is cleared
    ///
    /// If the system disables the tap the loop stops on its own and the
    /// controller is told the listener is gone.
    fn run_event_loop(
        controller: HotkeyController,
        running: Arc<AtomicBool>,
        ready_tx: std_mpsc::Sender<Result<(), HotkeyError>>,
    ) {
        let lost = Arc::new(AtomicBool::new(false));
        let tap_lost = Arc::clone(&lost);
        let tap_running = Arc::clone(&running);
        let tap_controller = controller.clone();

        // CGEventTap callback - must be fast and non-blocking
        let callback = move |_proxy: CGEventTapProxy,
                             event_type: CGEventType,
                             event: &CGEvent|
              -> Option<CGEvent> {
            let kind = match event_type {
                CGEventType::KeyDown => TapEvent::KeyDown,
                CGEventType::KeyUp => TapEvent::KeyUp,
                CGEventType::FlagsChanged => TapEvent::FlagsChanged,
                CGEventType::TapDisabledByTimeout | CGEventType::TapDisabledByUserInput => {
                    warn!(?event_type, "event tap disabled by the system, stopping listener");
                    tap_lost.store(true, Ordering::SeqCst);
                    tap_running.store(false, Ordering::SeqCst);
                    return Some(event.clone());
                }
                _ => return Some(event.clone()),
            };

            let raw = translate(
                kind,
                event.get_integer_value_field(EventField::KEYBOARD_EVENT_KEYCODE),
                ModifierSet::from_cg_flags(event.get_flags()),
                event.get_integer_value_field(EventField::KEYBOARD_EVENT_AUTOREPEAT),
            );

            if tap_controller.handle(raw) {
                None
            } else {
                Some(event.clone())
            }
        };

        let tap = match CGEventTap::new(
            CGEventTapLocation::Session,
            CGEventTapPlacement::HeadInsertEventTap,
            CGEventTapOptions::Default,
            vec![
                CGEventType::KeyDown,
                CGEventType::KeyUp,
                CGEventType::FlagsChanged,
            ],
            callback,
        ) {
            Ok(tap) => tap,
            Err(()) => {
                error!("failed to create event tap - is Accessibility permission granted?");
                let _ = ready_tx.send(Err(HotkeyError::EventTapCreation));
                return;
            }
        };

        let run_loop_source = match tap.mach_port.create_runloop_source(0) {
            Ok(source) => source,
            Err(()) => {
                error!("failed to create run loop source for event tap");
                let _ = ready_tx.send(Err(HotkeyError::EventTapCreation));
                return;
            }
        };

        let run_loop = CFRunLoop::get_current();
        unsafe {
            run_loop.add_source(&run_loop_source, kCFRunLoopCommonModes);
        }
        tap.enable();

        info!("event tap created and enabled");
        let _ = ready_tx.send(Ok(()));

        while running.load(Ordering::SeqCst) {
            CFRunLoop::run_in_mode(
                unsafe { kCFRunLoopDefaultMode },
                Duration::from_millis(100),
                true,
            );
        }

        if lost.load(Ordering::SeqCst) {
            controller.interception_lost();
        }
        // Tap and run loop source are released when they go out of scope
    }
}

#[cfg(not(target_os = "macos"))]
mod platform {
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    use tracing::warn;

    use super::HotkeyError;
    use crate::engine::HotkeyController;

    pub(super) fn spawn(
        _controller: HotkeyController,
        _running: Arc<AtomicBool>,
    ) -> Result<(), HotkeyError> {
        warn!("global key interception requires macOS");
        Err(HotkeyError::Unsupported)
    }
}
