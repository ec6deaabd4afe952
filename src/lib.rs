//! hotkey-daemon: global hotkey detection for push-to-talk and toggle recording
//!
//! The library holds the hotkey engine and the adapters around it:
//! - Per-event decision engine with Toggle and Hold state machines
//! - Configuration validation, mismatch hints and status rendering
//! - CGEventTap interception boundary (macOS)
//! - Recording session tracking, IPC server and signal handling

pub mod config;
pub mod engine;
pub mod events;
pub mod hotkey;
pub mod ipc;
pub mod lifecycle;
pub mod recording;
