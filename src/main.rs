//! hotkey-daemon: Background daemon for global push-to-talk hotkeys
//!
//! This daemon runs as a LaunchAgent and provides:
//! - Global hotkey interception via CGEventTap
//! - Toggle and hold-to-talk activation with modifier gating
//! - IPC server for menu bar app communication
//!
//! Audio capture and transcription live elsewhere; this process only
//! decides when recording starts and stops.

use anyhow::Result;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use hotkey_daemon::config::{DaemonConfig, FileConfigSource, HotkeyConfig};
use hotkey_daemon::engine::{HotkeyController, HotkeyEngine};
use hotkey_daemon::events::StateEvent;
use hotkey_daemon::hotkey::{HotkeyListener, MacKeyTable};
use hotkey_daemon::ipc::Server;
use hotkey_daemon::lifecycle::{ReloadSignal, ShutdownSignal};
use hotkey_daemon::recording::RecordingSession;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "hotkey-daemon starting"
    );

    // Load configuration
    let config = DaemonConfig::load()?;
    config.ensure_dirs()?;
    info!(
        ?config.socket_path,
        ?config.hotkey_config_path,
        "configuration loaded"
    );

    let mut shutdown = ShutdownSignal::new();
    let mut reload = ReloadSignal::new();

    // Create channels for inter-component communication
    // Hotkey engine -> recording session
    let (intent_tx, intent_rx) = mpsc::channel(32);
    // Controller and recording session -> IPC server
    let (event_tx, _event_rx) = broadcast::channel::<StateEvent>(64);

    // The engine starts from defaults and is replaced by the first reload
    let engine = HotkeyEngine::new(Box::new(MacKeyTable), HotkeyConfig::default());
    let source = FileConfigSource::new(&config.hotkey_config_path);
    info!(path = ?source.path(), "hotkey configuration source");
    let controller = HotkeyController::new(
        engine,
        Box::new(source),
        Box::new(HotkeyListener::new()),
        intent_tx,
        event_tx.clone(),
    );

    if let Err(e) = controller.reload_config() {
        error!(?e, "failed to load hotkey configuration, using defaults");
    }
    resume(&controller);

    let mut recording = RecordingSession::new(controller.subscribe(), event_tx.clone());

    let server = Server::new(&config.socket_path, controller.clone(), event_tx.clone())?;
    let mut server_event_rx = event_tx.subscribe();
    let server_for_events = &server;

    info!(summary = %controller.configured_combo_summary(), "daemon initialized, entering main loop");

    // Main event loop
    tokio::select! {
        // Turn hotkey intents into recording sessions
        _ = recording.run(intent_rx) => {
            info!("recording session exited");
        }

        // Run the IPC server (accepts client connections)
        result = server.run() => {
            if let Err(e) = result {
                error!(?e, "IPC server error");
            }
        }

        // Keep the IPC server's view of recording in sync
        _ = async {
            loop {
                match server_event_rx.recv().await {
                    Ok(event) => {
                        info!(%event, "state event");
                        match event {
                            StateEvent::RecordingStarted { .. } => {
                                server_for_events.set_recording(true).await;
                            }
                            StateEvent::RecordingStopped { .. } => {
                                server_for_events.set_recording(false).await;
                            }
                            _ => {}
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "state event receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
        } => {
            info!("state event handler exited");
        }

        // Reload the hotkey configuration on SIGHUP
        _ = async {
            loop {
                reload.recv().await;
                let controller = controller.clone();
                let result = tokio::task::spawn_blocking(move || {
                    match controller.reload_config() {
                        Ok(validation) => {
                            info!(?validation, "hotkey configuration reloaded");
                            resume(&controller);
                        }
                        Err(e) => error!(?e, "failed to reload hotkey configuration"),
                    }
                })
                .await;
                if let Err(e) = result {
                    error!(?e, "reload task failed");
                }
            }
        } => {}

        // Wait for shutdown signal
        _ = shutdown.wait() => {
            info!("shutdown signal received");
        }
    }

    // Cleanup
    info!("shutting down...");

    controller.suspend();
    server.shutdown().await;

    info!("hotkey-daemon stopped");

    Ok(())
}

/// Start listening if the configuration allows it, logging the outcome
fn resume(controller: &HotkeyController) {
    match controller.resume_if_possible() {
        Ok(true) => info!("hotkey listener active"),
        Ok(false) => warn!(status = %controller.status_message(), "hotkey listener not started"),
        Err(e) => {
            error!(?e, "failed to start hotkey listener");
            warn!("continuing without hotkey support - check Accessibility permissions");
        }
    }
}
