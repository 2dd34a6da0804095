//! Per-call cancellation signal.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Owner side of a cancellation signal.
///
/// Clones fire the same signal. Dropping every clone without calling
/// [`CancelHandle::cancel`] leaves the signal un-cancelled forever.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    /// Create a handle and the signal it controls.
    pub fn new() -> (Self, CancellationSignal) {
        let (tx, rx) = watch::channel(false);
        (Self { tx: Arc::new(tx) }, CancellationSignal { rx })
    }

    /// Fire the signal. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Another signal observing this handle.
    pub fn signal(&self) -> CancellationSignal {
        CancellationSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Fire the signal once `after` has elapsed.
    ///
    /// This is how callers put a deadline on a whole call, retries included.
    pub fn cancel_after(&self, after: Duration) -> tokio::task::JoinHandle<()> {
        let handle = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            tracing::debug!(after_ms = after.as_millis() as u64, "Call deadline reached");
            handle.cancel();
        })
    }
}

/// Observer side of a cancellation signal, cloned through every stage.
#[derive(Debug, Clone)]
pub struct CancellationSignal {
    rx: watch::Receiver<bool>,
}

impl CancellationSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (_, signal) = CancelHandle::new();
        signal
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the signal fires. Pending forever if the handle is
    /// dropped un-fired.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

impl Default for CancellationSignal {
    fn default() -> Self {
        Self::never()
    }
}
