//! Shutdown signalling
//!
//! A `Shutdown` owns the trigger; any number of cheap `ShutdownToken` clones
//! observe it. Tokens taken from a child `Shutdown` also observe every parent,
//! so a component can be stopped on its own or together with the process.

use futures::future::select_all;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Trigger side of a shutdown signal
#[derive(Debug)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
    rx: watch::Receiver<bool>,
    parents: Vec<watch::Receiver<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx,
            rx,
            parents: Vec::new(),
        }
    }

    /// A shutdown that also fires when `parent` fires
    pub fn child_of(parent: &ShutdownToken) -> Self {
        let mut child = Self::new();
        child.parents = parent.watchers.clone();
        child
    }

    pub fn token(&self) -> ShutdownToken {
        let mut watchers = self.parents.clone();
        watchers.push(self.rx.clone());
        ShutdownToken { watchers }
    }

    /// Fire the signal. Repeated calls are ignored.
    pub fn request_shutdown(&self) {
        if self.tx.send_replace(true) {
            warn!("Shutdown already requested, ignoring duplicate request");
            return;
        }
        info!("Shutdown requested");
    }

    pub fn is_shutdown_requested(&self) -> bool {
        *self.rx.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer side, handed to every long-running task
#[derive(Debug, Clone)]
pub struct ShutdownToken {
    watchers: Vec<watch::Receiver<bool>>,
}

impl ShutdownToken {
    /// True once any watched signal fired or its owner was dropped
    pub fn is_cancelled(&self) -> bool {
        self.watchers
            .iter()
            .any(|rx| *rx.borrow() || rx.has_changed().is_err())
    }

    /// Resolves when any watched signal fires. A dropped `Shutdown` counts as fired.
    pub async fn cancelled(&self) {
        let waits = self.watchers.iter().cloned().map(|mut rx| {
            Box::pin(async move {
                let _ = rx.wait_for(|fired| *fired).await;
            })
        });
        select_all(waits).await;
    }
}

/// Route SIGINT/SIGTERM (Ctrl+C elsewhere) into `shutdown`
pub fn install_signal_handlers(shutdown: Arc<Shutdown>) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        for (kind, name) in [
            (SignalKind::terminate(), "SIGTERM"),
            (SignalKind::interrupt(), "SIGINT"),
        ] {
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                let mut stream = match signal(kind) {
                    Ok(stream) => stream,
                    Err(e) => {
                        error!(error = %e, "Failed to install {} handler", name);
                        return;
                    }
                };
                stream.recv().await;
                info!("Received {}", name);
                shutdown.request_shutdown();
            });
        }
    }

    #[cfg(not(unix))]
    {
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to install Ctrl+C handler");
                return;
            }
            info!("Received Ctrl+C");
            shutdown.request_shutdown();
        });
    }
}
