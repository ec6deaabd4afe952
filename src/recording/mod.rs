//! Recording session module
//!
//! Stands in for the recording controller: receives start/stop intents
//! from the hotkey engine and announces session boundaries.

mod session;

pub use session::RecordingSession;
