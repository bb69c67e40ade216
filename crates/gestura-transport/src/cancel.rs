//! Cooperative cancellation of retry loops

use std::time::Duration;

use tokio::sync::watch;

/// Owner side, cancels every linked [`Cancellation`]
#[derive(Debug)]
pub struct CancellationHandle {
    tx: watch::Sender<bool>,
}

/// Observer side, checked between attempts and raced against backoff sleeps
#[derive(Debug, Clone)]
pub struct Cancellation {
    rx: watch::Receiver<bool>,
}

impl CancellationHandle {
    pub fn new() -> (CancellationHandle, Cancellation) {
        let (tx, rx) = watch::channel(false);
        (CancellationHandle { tx }, Cancellation { rx })
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Another observer of this handle
    pub fn token(&self) -> Cancellation {
        Cancellation {
            rx: self.tx.subscribe(),
        }
    }
}

impl Cancellation {
    /// A token that is never cancelled
    pub fn never() -> Cancellation {
        let (_, token) = CancellationHandle::new();
        token
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancelled
    ///
    /// A dropped handle without a prior `cancel()` never resolves.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        let closed = rx.wait_for(|c| *c).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }

    /// Sleep for `dt`, returns `false` if cancelled first
    pub async fn sleep(&self, dt: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(dt) => true,
            _ = self.cancelled() => false,
        }
    }
}
