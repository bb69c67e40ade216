//! Pipeline events

use tokio::sync::mpsc;

use gestura_core::{GesturaError, GesturaResult, TranslationResult};

/// Notification for the display side
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// A gesture was recognized and is now displayed
    Recognized(TranslationResult),
    /// The displayed gesture timed out
    Expired,
    /// Buffered frames and the displayed result were discarded
    Reset,
    /// Recognizer reachability changed
    ServerStatus(bool),
}

/// Non-blocking sending half of the event channel
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::Sender<PipelineEvent>,
}

impl EventSink {
    pub fn channel(capacity: usize) -> (EventSink, mpsc::Receiver<PipelineEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (EventSink { tx }, rx)
    }

    /// Queue an event without waiting
    ///
    /// A full channel drops the event with a warning.
    pub fn emit(&self, event: PipelineEvent) -> GesturaResult<()> {
        match self.tx.try_send(event) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(event)) => {
                tracing::warn!(?event, "event channel full, dropping event");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(GesturaError::ChannelClosed),
        }
    }

    /// Emit, logging instead of failing
    pub(crate) fn publish(&self, event: PipelineEvent) {
        if let Err(e) = self.emit(event) {
            tracing::debug!(error = %e, "event not delivered");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
