//! Recognizer availability monitor

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use gestura_transport::{Cancellation, RecognizerBackend, TransportClient};

use crate::{EventSink, PipelineEvent};

/// Last observed reachability, `None` before the first probe
#[derive(Debug, Default)]
pub struct Availability {
    state: Mutex<Option<bool>>,
}

impl Availability {
    pub fn get(&self) -> Option<bool> {
        *self.state.lock()
    }

    /// Store an observation; `true` when it differs from the previous one
    pub fn update(&self, available: bool) -> bool {
        let mut state = self.state.lock();
        let changed = *state != Some(available);
        *state = Some(available);
        changed
    }
}

/// Probe immediately, then every `interval`, until `cancel` fires
pub(crate) fn spawn_monitor<B: RecognizerBackend>(
    runtime: &Handle,
    transport: Arc<TransportClient<B>>,
    availability: Arc<Availability>,
    events: EventSink,
    interval: Duration,
    cancel: Cancellation,
) -> JoinHandle<()> {
    runtime.spawn(async move {
        loop {
            let available = tokio::select! {
                available = transport.check_availability() => available,
                _ = cancel.cancelled() => break,
            };

            if availability.update(available) {
                if available {
                    tracing::info!(endpoint = %transport.endpoint().url(), "recognizer reachable");
                } else {
                    tracing::warn!(endpoint = %transport.endpoint().url(), "recognizer unreachable");
                }
                events.publish(PipelineEvent::ServerStatus(available));
            }

            if !cancel.sleep(interval).await {
                break;
            }
        }
        tracing::debug!("availability monitor stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_reports_changes() {
        let a = Availability::default();
        assert_eq!(a.get(), None);
        assert!(a.update(false));
        assert!(!a.update(false));
        assert!(a.update(true));
        assert_eq!(a.get(), Some(true));
    }
}
