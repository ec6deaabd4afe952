//! Signal handling for graceful shutdown and configuration reload

use tokio::signal::unix::{signal, Signal, SignalKind};
use tracing::{debug, warn};

/// Handles shutdown signals (SIGTERM, SIGINT)
pub struct ShutdownSignal {
    sigterm: Option<Signal>,
    sigint: Option<Signal>,
}

impl ShutdownSignal {
    /// Register the shutdown signal handlers
    ///
    /// Must be called from within a tokio runtime.
    pub fn new() -> Self {
        Self {
            sigterm: register(SignalKind::terminate(), "SIGTERM"),
            sigint: register(SignalKind::interrupt(), "SIGINT"),
        }
    }

    /// Wait for a shutdown signal
    pub async fn wait(&mut self) {
        tokio::select! {
            _ = recv(&mut self.sigterm) => {
                debug!("received SIGTERM");
            }
            _ = recv(&mut self.sigint) => {
                debug!("received SIGINT");
            }
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Handles configuration reload requests (SIGHUP)
pub struct ReloadSignal {
    sighup: Option<Signal>,
}

impl ReloadSignal {
    pub fn new() -> Self {
        Self {
            sighup: register(SignalKind::hangup(), "SIGHUP"),
        }
    }

    /// Wait for the next reload request
    pub async fn recv(&mut self) {
        recv(&mut self.sighup).await;
        debug!("received SIGHUP");
    }
}

impl Default for ReloadSignal {
    fn default() -> Self {
        Self::new()
    }
}

fn register(kind: SignalKind, name: &str) -> Option<Signal> {
    match signal(kind) {
        Ok(signal) => Some(signal),
        Err(e) => {
            warn!(?e, signal = name, "failed to register signal handler");
            None
        }
    }
}

/// Resolve on the next delivery, or never if the handler is missing
async fn recv(signal: &mut Option<Signal>) {
    match signal {
        Some(signal) => {
            if signal.recv().await.is_none() {
                std::future::pending::<()>().await;
            }
        }
        None => std::future::pending::<()>().await,
    }
}
