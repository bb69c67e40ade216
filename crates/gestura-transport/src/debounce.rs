//! Debounce of successful submissions
//!
//! A submission reserves its slot under the same lock that checks the
//! window, so concurrent callers are serialized in time: while one
//! submission is in progress, another starting within the interval of it is
//! suppressed.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use gestura_core::Timestamp;

#[derive(Debug, Default)]
struct DebounceState {
    last_success: Option<Timestamp>,
    reserved: Option<Timestamp>,
}

impl DebounceState {
    fn within(mark: Option<Timestamp>, now: Timestamp, interval: Duration) -> bool {
        match mark {
            Some(at) => now >= at && now.saturating_since(at) < interval,
            None => false,
        }
    }

    fn is_suppressed(&self, now: Timestamp, interval: Duration) -> bool {
        Self::within(self.last_success, now, interval) || Self::within(self.reserved, now, interval)
    }
}

/// Time of the last successful submission, shared by every clone
#[derive(Debug, Clone, Default)]
pub struct Debounce {
    state: Arc<Mutex<DebounceState>>,
}

impl Debounce {
    pub fn new() -> Self {
        Self::default()
    }

    /// `now` falls within `interval` of the last success or of a submission
    /// still in progress
    pub fn is_suppressed(&self, now: Timestamp, interval: Duration) -> bool {
        self.state.lock().is_suppressed(now, interval)
    }

    /// Claim the submission slot at `now`, `None` when suppressed
    ///
    /// The slot is released when dropped unless [`DebounceSlot::commit`] was
    /// called.
    pub fn try_reserve(&self, now: Timestamp, interval: Duration) -> Option<DebounceSlot> {
        let mut state = self.state.lock();
        if state.is_suppressed(now, interval) {
            return None;
        }
        state.reserved = Some(now);
        Some(DebounceSlot {
            debounce: self.clone(),
            reserved_at: now,
            committed: false,
        })
    }

    pub fn last_success(&self) -> Option<Timestamp> {
        self.state.lock().last_success
    }
}

/// A reserved submission slot
#[derive(Debug)]
pub struct DebounceSlot {
    debounce: Debounce,
    reserved_at: Timestamp,
    committed: bool,
}

impl DebounceSlot {
    /// Record the submission as successful at `at`
    pub fn commit(mut self, at: Timestamp) {
        let mut state = self.debounce.state.lock();
        state.last_success = Some(at);
        if state.reserved == Some(self.reserved_at) {
            state.reserved = None;
        }
        self.committed = true;
    }
}

impl Drop for DebounceSlot {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        let mut state = self.debounce.state.lock();
        if state.reserved == Some(self.reserved_at) {
            state.reserved = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(50);

    #[test]
    fn test_debounce_window() {
        let d = Debounce::new();
        assert!(!d.is_suppressed(Timestamp::from_millis(100), INTERVAL));

        d.try_reserve(Timestamp::from_millis(90), INTERVAL)
            .unwrap()
            .commit(Timestamp::from_millis(100));
        assert!(d.is_suppressed(Timestamp::from_millis(100), INTERVAL));
        assert!(d.is_suppressed(Timestamp::from_millis(149), INTERVAL));
        assert!(!d.is_suppressed(Timestamp::from_millis(150), INTERVAL));
    }

    #[test]
    fn test_reservation_suppresses_concurrent_caller() {
        let d = Debounce::new();
        let slot = d.try_reserve(Timestamp::from_millis(100), INTERVAL);
        assert!(slot.is_some());
        assert!(d.try_reserve(Timestamp::from_millis(120), INTERVAL).is_none());
        // A reservation older than the interval no longer blocks
        assert!(d.try_reserve(Timestamp::from_millis(150), INTERVAL).is_some());
    }

    #[test]
    fn test_dropped_slot_releases() {
        let d = Debounce::new();
        drop(d.try_reserve(Timestamp::from_millis(100), INTERVAL));
        assert!(d.try_reserve(Timestamp::from_millis(101), INTERVAL).is_some());
        assert_eq!(d.last_success(), None);
    }

    #[test]
    fn test_clones_share_state() {
        let a = Debounce::new();
        let b = a.clone();
        a.try_reserve(Timestamp::from_millis(1), INTERVAL)
            .unwrap()
            .commit(Timestamp::from_millis(7));
        assert_eq!(b.last_success(), Some(Timestamp::from_millis(7)));
    }
}
