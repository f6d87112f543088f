//! Shutdown coordination for the server.

use tokio::sync::broadcast;

/// Coordinator for graceful shutdown.
///
/// One `Shutdown` lives for the process; long-running tasks hold a
/// [`ShutdownSignal`] and finish their current work when it fires. An
/// in-flight pipeline that is dropped instead kills its child processes,
/// so either path leaves nothing behind.
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Obtain a signal handle for one task.
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Fire the shutdown signal. Idempotent; later calls are no-ops as
    /// far as subscribers are concerned.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Number of tasks still holding a signal handle.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// One task's view of the shutdown broadcast.
pub struct ShutdownSignal {
    rx: broadcast::Receiver<()>,
}

impl ShutdownSignal {
    /// Resolve when shutdown has been triggered.
    ///
    /// Also resolves if the coordinator was dropped; a server without a
    /// coordinator has nothing left to wait for.
    pub async fn wait(mut self) {
        let _ = self.rx.recv().await;
    }
}
