//! Pipeline orchestrator
//!
//! Detection cycle:
//!
//! ```text
//! Idle -> Extracting -> Buffering -> (ready) Transmitting -> Idle
//!   ^                                   |
//!   +---------- Reset (facing change) <-+
//! ```
//!
//! Extraction and admission run synchronously in the detector callback.
//! Transmission runs on the I/O runtime, one at a time. Each reset bumps an
//! epoch; a transmission that started in an older epoch never publishes.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use gestura_core::{
    Clock, Detection, GesturaError, GesturaResult, PipelineConfig, ServerConfig, SystemClock, TranslationResult,
};
use gestura_features::{FeatureExtractor, Noise};
use gestura_sequence::{AdmitOutcome, BufferStats, SequenceBuffer};
use gestura_transport::{
    Cancellation, CancellationHandle, HttpBackend, RecognizerBackend, SubmitOutcome, TransportClient, TransportStats,
};

use crate::health::spawn_monitor;
use crate::{Availability, DisplayState, EventSink, OverlayFrame, PipelineEvent};

/// What one detection led to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No hands, nothing buffered
    Skipped,
    /// Offered to the buffer, window not ready yet
    Buffered { admitted: bool },
    /// A window was handed to the I/O runtime
    Dispatched,
    /// Window ready but a transmission is still in flight
    Deferred,
}

/// Pipeline counters
#[derive(Clone, Debug, Default)]
pub struct PipelineStats {
    pub detections: u64,
    pub skipped: u64,
    pub frames_admitted: u64,
    pub frames_discarded: u64,
    pub dispatched: u64,
    pub deferred: u64,
    pub failed_submissions: u64,
    pub cancelled_submissions: u64,
    pub recognized: u64,
    pub empty_results: u64,
    pub stale_results: u64,
    pub expired: u64,
    pub resets: u64,
}

/// State shared with tasks on the I/O runtime
struct Shared<B> {
    config: PipelineConfig,
    clock: Arc<dyn Clock>,
    buffer: SequenceBuffer,
    transport: Arc<TransportClient<B>>,
    events: EventSink,
    display: Mutex<DisplayState>,
    expiry: Mutex<Option<JoinHandle<()>>>,
    in_flight: AtomicBool,
    epoch: AtomicU64,
    submission: Mutex<CancellationHandle>,
    stats: Mutex<PipelineStats>,
    runtime: Handle,
}

/// Clears the in-flight flag when a transmission task ends or is dropped
struct InFlight<B>(Arc<Shared<B>>);

impl<B> Drop for InFlight<B> {
    fn drop(&mut self) {
        self.0.in_flight.store(false, Ordering::Release);
    }
}

impl<B: RecognizerBackend> Shared<B> {
    fn is_stale(&self, epoch: u64) -> bool {
        self.epoch.load(Ordering::Acquire) != epoch
    }

    async fn transmit(self: &Arc<Self>, epoch: u64, cancel: Cancellation) {
        let sequence = self.buffer.extract_sequence();
        if sequence.is_empty() {
            return;
        }

        let outcome = self
            .transport
            .submit_with_cancel(sequence.as_slice(), self.config.transport.max_retries, &cancel)
            .await;
        match outcome {
            SubmitOutcome::Sent { .. } | SubmitOutcome::Debounced => {}
            SubmitOutcome::Cancelled { attempts } => {
                tracing::debug!(attempts, "transmission cancelled");
                self.stats.lock().cancelled_submissions += 1;
                return;
            }
            other => {
                tracing::debug!(outcome = ?other, "transmission failed");
                self.stats.lock().failed_submissions += 1;
                return;
            }
        }

        if self.is_stale(epoch) {
            self.stats.lock().stale_results += 1;
            return;
        }

        let result = self.transport.get_translation().await;
        if result.is_empty() {
            self.stats.lock().empty_results += 1;
            return;
        }
        self.show(result, epoch);
    }

    fn show(self: &Arc<Self>, result: TranslationResult, epoch: u64) {
        let now = self.clock.now();
        // Held until the expiry task is armed: a concurrent reset or shutdown
        // either clears everything done here, or this result is dropped.
        let mut display = self.display.lock();
        if self.is_stale(epoch) {
            drop(display);
            tracing::debug!(gesture = %result.gesture, "discarding result from before reset");
            self.stats.lock().stale_results += 1;
            return;
        }
        let generation = display.show(result.clone(), now);

        tracing::info!(
            gesture = %result.gesture,
            confidence = result.confidence,
            class_id = result.class_id,
            "gesture recognized"
        );
        self.stats.lock().recognized += 1;
        self.events.publish(PipelineEvent::Recognized(result));

        let shared = self.clone();
        let lifetime = self.config.display_lifetime;
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(lifetime).await;
            shared.expire(generation);
        });
        if let Some(previous) = self.expiry.lock().replace(task) {
            previous.abort();
        }
    }

    fn expire(&self, generation: u64) {
        if self.display.lock().expire(generation) {
            tracing::debug!(generation, "displayed gesture expired");
            self.stats.lock().expired += 1;
            self.events.publish(PipelineEvent::Expired);
        }
    }

    fn reset(&self) {
        self.buffer.clear();
        self.epoch.fetch_add(1, Ordering::AcqRel);

        let previous = std::mem::replace(&mut *self.submission.lock(), CancellationHandle::new().0);
        previous.cancel();

        self.display.lock().clear();
        if let Some(task) = self.expiry.lock().take() {
            task.abort();
        }

        self.stats.lock().resets += 1;
        tracing::debug!("pipeline reset");
        self.events.publish(PipelineEvent::Reset);
    }
}

/// Gesture pipeline
pub struct Pipeline<B: RecognizerBackend = HttpBackend> {
    shared: Arc<Shared<B>>,
    extractor: Mutex<FeatureExtractor>,
    last_facing: Mutex<Option<bool>>,
    overlay: Mutex<Option<OverlayFrame>>,
    availability: Arc<Availability>,
    lifecycle: CancellationHandle,
    monitor: Mutex<Option<JoinHandle<()>>>,
}

impl Pipeline<HttpBackend> {
    /// Pipeline talking to `config.server` over HTTP
    pub fn connect(
        config: PipelineConfig,
        runtime: Handle,
    ) -> GesturaResult<(Self, mpsc::Receiver<PipelineEvent>)> {
        let transport = TransportClient::new(config.server.clone(), config.transport.clone())?;
        Ok(Self::new(config, transport, runtime))
    }
}

impl<B: RecognizerBackend> Pipeline<B> {
    /// Build a pipeline around `transport`, spawning I/O work on `runtime`
    ///
    /// The transport keeps its own endpoint; `config.server` is only read by
    /// [`Pipeline::connect`].
    pub fn new(
        config: PipelineConfig,
        transport: TransportClient<B>,
        runtime: Handle,
    ) -> (Self, mpsc::Receiver<PipelineEvent>) {
        Self::with_clock(config, transport, runtime, Arc::new(SystemClock))
    }

    /// Like [`Pipeline::new`] on the runtime of the calling context
    pub fn in_current_runtime(
        config: PipelineConfig,
        transport: TransportClient<B>,
    ) -> GesturaResult<(Self, mpsc::Receiver<PipelineEvent>)> {
        let runtime = Handle::try_current().map_err(|e| GesturaError::RuntimeUnavailable(e.to_string()))?;
        Ok(Self::new(config, transport, runtime))
    }

    pub fn with_clock(
        config: PipelineConfig,
        transport: TransportClient<B>,
        runtime: Handle,
        clock: Arc<dyn Clock>,
    ) -> (Self, mpsc::Receiver<PipelineEvent>) {
        let (events, rx) = EventSink::channel(config.event_capacity);
        let buffer = SequenceBuffer::with_clock(config.sequence.clone(), clock.clone(), Noise::from_entropy());
        let transport = Arc::new(transport);
        let availability = Arc::new(Availability::default());
        let (lifecycle, _) = CancellationHandle::new();

        let monitor = config.availability_interval.map(|interval| {
            spawn_monitor(
                &runtime,
                transport.clone(),
                availability.clone(),
                events.clone(),
                interval,
                lifecycle.token(),
            )
        });

        let shared = Arc::new(Shared {
            config,
            clock,
            buffer,
            transport,
            events,
            display: Mutex::new(DisplayState::new()),
            expiry: Mutex::new(None),
            in_flight: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
            submission: Mutex::new(CancellationHandle::new().0),
            stats: Mutex::new(PipelineStats::default()),
            runtime,
        });

        let pipeline = Pipeline {
            shared,
            extractor: Mutex::new(FeatureExtractor::new()),
            last_facing: Mutex::new(None),
            overlay: Mutex::new(None),
            availability,
            lifecycle,
            monitor: Mutex::new(monitor),
        };
        (pipeline, rx)
    }

    /// Run one detection cycle
    ///
    /// Never blocks on I/O; transmission is spawned on the runtime.
    pub fn on_detection(&self, detection: &Detection) -> CycleOutcome {
        if self.lifecycle.is_cancelled() {
            return CycleOutcome::Skipped;
        }
        self.shared.stats.lock().detections += 1;

        self.track_facing(detection.is_front_camera);
        *self.overlay.lock() = Some(OverlayFrame::from_detection(detection));

        if detection.keypoints.is_empty() {
            return self.skip();
        }
        let features = self
            .extractor
            .lock()
            .extract(&detection.keypoints, detection.is_front_camera);
        if features.is_noise_floor() {
            tracing::trace!(hands = detection.keypoints.hands.len(), "no well-formed hands");
            return self.skip();
        }

        let admitted = match self.shared.buffer.add_frame(&features) {
            AdmitOutcome::Admitted { len, window_reset } => {
                tracing::trace!(len, window_reset, "frame admitted");
                self.shared.stats.lock().frames_admitted += 1;
                true
            }
            AdmitOutcome::Discarded { .. } => {
                self.shared.stats.lock().frames_discarded += 1;
                false
            }
        };

        if !self.shared.buffer.is_ready() {
            return CycleOutcome::Buffered { admitted };
        }

        if self
            .shared
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::trace!("transmission in flight, window deferred");
            self.shared.stats.lock().deferred += 1;
            return CycleOutcome::Deferred;
        }

        self.dispatch();
        CycleOutcome::Dispatched
    }

    fn skip(&self) -> CycleOutcome {
        self.shared.stats.lock().skipped += 1;
        CycleOutcome::Skipped
    }

    fn track_facing(&self, front: bool) {
        let changed = {
            let mut last = self.last_facing.lock();
            let changed = matches!(*last, Some(previous) if previous != front);
            *last = Some(front);
            changed
        };
        if changed {
            tracing::info!(front, "camera facing changed");
            self.shared.reset();
        }
    }

    fn dispatch(&self) {
        let shared = self.shared.clone();
        let epoch = shared.epoch.load(Ordering::Acquire);
        let cancel = shared.submission.lock().token();
        let guard = InFlight(shared.clone());
        shared.stats.lock().dispatched += 1;

        self.shared.runtime.spawn(async move {
            let _guard = guard;
            shared.transmit(epoch, cancel).await;
        });
    }

    /// Flip the camera facing and reset
    pub fn switch_camera(&self) {
        if let Some(front) = self.last_facing.lock().as_mut() {
            *front = !*front;
        }
        self.shared.reset();
    }

    /// Drop buffered frames, the pending transmission and the shown result
    pub fn reset(&self) {
        self.shared.reset();
    }

    /// Point at another recognizer, buffered frames are kept
    pub fn set_endpoint(&self, server: ServerConfig) {
        self.shared.transport.set_endpoint(server);
    }

    pub fn endpoint(&self) -> ServerConfig {
        self.shared.transport.endpoint()
    }

    /// Gesture currently displayed
    pub fn current_result(&self) -> Option<TranslationResult> {
        self.shared.display.lock().current().cloned()
    }

    /// Last detector frame for the landmark overlay
    pub fn overlay(&self) -> Option<OverlayFrame> {
        self.overlay.lock().clone()
    }

    /// Last availability probe, `None` before the first one
    pub fn server_available(&self) -> Option<bool> {
        self.availability.get()
    }

    pub fn is_transmitting(&self) -> bool {
        self.shared.in_flight.load(Ordering::Acquire)
    }

    pub fn buffered_frames(&self) -> usize {
        self.shared.buffer.len()
    }

    pub fn stats(&self) -> PipelineStats {
        self.shared.stats.lock().clone()
    }

    pub fn buffer_stats(&self) -> BufferStats {
        self.shared.buffer.stats()
    }

    pub fn transport_stats(&self) -> TransportStats {
        self.shared.transport.stats()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.shared.config
    }

    /// Stop background work
    ///
    /// Cancels the availability monitor, the pending expiry and any retry
    /// loop, and clears the shown result. Requests already on the wire finish
    /// or time out on their own, but their results are never published.
    pub fn shutdown(&self) {
        if self.lifecycle.is_cancelled() {
            return;
        }
        self.lifecycle.cancel();
        if let Some(monitor) = self.monitor.lock().take() {
            monitor.abort();
        }
        self.shared.submission.lock().cancel();
        self.shared.epoch.fetch_add(1, Ordering::AcqRel);
        self.shared.display.lock().clear();
        if let Some(task) = self.shared.expiry.lock().take() {
            task.abort();
        }
        tracing::debug!("pipeline shut down");
    }
}

impl<B: RecognizerBackend> Drop for Pipeline<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<B: RecognizerBackend> std::fmt::Debug for Pipeline<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("buffered_frames", &self.buffered_frames())
            .field("transmitting", &self.is_transmitting())
            .field("endpoint", &self.endpoint())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gestura_core::{Hand, KeypointSet, Landmark, ManualClock, Timestamp, TransportConfig};
    use gestura_transport::{HttpReply, TransportError, TransportResult};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    struct Recognizer {
        gesture: Mutex<&'static str>,
        latency: Duration,
        available: AtomicBool,
        posts: AtomicUsize,
        polls: AtomicUsize,
    }

    impl Recognizer {
        fn new(latency: Duration) -> Arc<Self> {
            Arc::new(Recognizer {
                gesture: Mutex::new("hello"),
                latency,
                available: AtomicBool::new(true),
                posts: AtomicUsize::new(0),
                polls: AtomicUsize::new(0),
            })
        }

        fn posts(&self) -> usize {
            self.posts.load(Ordering::SeqCst)
        }
    }

    impl RecognizerBackend for Recognizer {
        async fn post_json(&self, _url: &str, _body: String) -> TransportResult<HttpReply> {
            self.posts.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.latency).await;
            Ok(HttpReply::ok("{}"))
        }

        async fn get(&self, url: &str) -> TransportResult<HttpReply> {
            if url.ends_with("/translation") {
                self.polls.fetch_add(1, Ordering::SeqCst);
                let gesture = *self.gesture.lock();
                return Ok(HttpReply::ok(format!(
                    r#"{{"gesture":"{gesture}","confidence":0.9,"class_id":3}}"#
                )));
            }
            if self.available.load(Ordering::SeqCst) {
                Ok(HttpReply::ok("up"))
            } else {
                Err(TransportError::Connect("down".into()))
            }
        }
    }

    type TestPipeline = Pipeline<Arc<Recognizer>>;

    fn pipeline_with(
        config: PipelineConfig,
        latency: Duration,
    ) -> (TestPipeline, mpsc::Receiver<PipelineEvent>, Arc<Recognizer>, Arc<ManualClock>) {
        let backend = Recognizer::new(latency);
        let clock = Arc::new(ManualClock::new(Timestamp::from_millis(1_000_000)));
        let transport = TransportClient::with_backend(
            backend.clone(),
            ServerConfig::new("127.0.0.1", 5000),
            TransportConfig::default(),
            clock.clone(),
        );
        let (pipeline, rx) = Pipeline::with_clock(config, transport, Handle::current(), clock.clone());
        (pipeline, rx, backend, clock)
    }

    fn pipeline(latency: Duration) -> (TestPipeline, mpsc::Receiver<PipelineEvent>, Arc<Recognizer>, Arc<ManualClock>) {
        let config = PipelineConfig {
            availability_interval: None,
            ..PipelineConfig::default()
        };
        pipeline_with(config, latency)
    }

    /// One hand, shifted by 0.1 per step so consecutive frames always differ
    fn detection(step: usize, front: bool) -> Detection {
        let o = 0.1 * (step % 6) as f32;
        let hand = Hand::new(
            (0..21)
                .map(|i| Landmark::new(o + 0.1 + i as f32 * 0.01, o + 0.2, o - 0.35))
                .collect(),
        );
        Detection::new(KeypointSet::new(vec![hand]), 640, 480, front)
    }

    fn feed(p: &TestPipeline, clock: &ManualClock, steps: std::ops::Range<usize>, front: bool) -> Vec<CycleOutcome> {
        steps
            .map(|step| {
                clock.advance(Duration::from_millis(100));
                p.on_detection(&detection(step, front))
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_flight_and_recognition() {
        let (p, mut rx, backend, clock) = pipeline(Duration::from_millis(500));

        let outcomes = feed(&p, &clock, 0..4, false);
        assert!(outcomes.iter().all(|o| *o == CycleOutcome::Buffered { admitted: true }));

        assert_eq!(feed(&p, &clock, 4..5, false), vec![CycleOutcome::Dispatched]);
        assert!(p.is_transmitting());
        assert_eq!(feed(&p, &clock, 5..6, false), vec![CycleOutcome::Deferred]);

        tokio::time::sleep(Duration::from_millis(600)).await;
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, PipelineEvent::Recognized(ref r) if r.gesture == "hello"));

        assert_eq!(backend.posts(), 1);
        assert!(!p.is_transmitting());
        assert_eq!(p.current_result().map(|r| r.class_id), Some(3));
        // Carry-over seeds the next window
        assert_eq!(p.buffered_frames(), 2);

        let stats = p.stats();
        assert_eq!(stats.dispatched, 1);
        assert_eq!(stats.deferred, 1);
        assert_eq!(stats.recognized, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_result_expires_after_display_lifetime() {
        let (p, mut rx, _backend, clock) = pipeline(Duration::from_millis(500));
        feed(&p, &clock, 0..5, false);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(matches!(rx.recv().await, Some(PipelineEvent::Recognized(_))));

        tokio::time::sleep(Duration::from_millis(2800)).await;
        assert!(p.current_result().is_some());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(rx.recv().await, Some(PipelineEvent::Expired));
        assert!(p.current_result().is_none());
        assert_eq!(p.stats().expired, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_gesture_supersedes_expiry() {
        let (p, mut rx, backend, clock) = pipeline(Duration::from_millis(500));
        feed(&p, &clock, 0..5, false);
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(matches!(rx.recv().await, Some(PipelineEvent::Recognized(_))));

        // Second window at t=2000ms, shown around t=2600ms
        tokio::time::sleep(Duration::from_millis(1400)).await;
        *backend.gesture.lock() = "thanks";
        let outcomes = feed(&p, &clock, 0..3, false);
        assert_eq!(outcomes.last(), Some(&CycleOutcome::Dispatched));
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(matches!(rx.recv().await, Some(PipelineEvent::Recognized(ref r)) if r.gesture == "thanks"));

        // Past the first expiry deadline, the second result is still shown
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(p.current_result().map(|r| r.gesture), Some("thanks".to_string()));
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(rx.recv().await, Some(PipelineEvent::Expired));
    }

    #[tokio::test(start_paused = true)]
    async fn test_facing_change_resets() {
        let (p, mut rx, _backend, clock) = pipeline(Duration::from_millis(500));
        feed(&p, &clock, 0..3, false);
        assert_eq!(p.buffered_frames(), 3);

        let outcome = feed(&p, &clock, 3..4, true);
        assert_eq!(outcome, vec![CycleOutcome::Buffered { admitted: true }]);
        assert_eq!(p.buffered_frames(), 1);
        assert_eq!(rx.try_recv().ok(), Some(PipelineEvent::Reset));
        assert_eq!(p.stats().resets, 1);
        assert!(p.overlay().unwrap().mirrored);

        // Same facing again: no further reset
        feed(&p, &clock, 4..5, true);
        assert_eq!(p.stats().resets, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_switch_camera_before_transmission_sends_nothing() {
        let (p, mut rx, backend, clock) = pipeline(Duration::from_millis(500));
        feed(&p, &clock, 0..5, false);
        p.switch_camera();

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(backend.posts(), 0);
        assert_eq!(rx.recv().await, Some(PipelineEvent::Reset));
        assert!(rx.try_recv().is_err());
        assert!(!p.is_transmitting());

        // The next detection carries the switched facing and does not reset again
        feed(&p, &clock, 0..1, true);
        assert_eq!(p.stats().resets, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_result_from_before_reset_discarded() {
        let (p, mut rx, backend, clock) = pipeline(Duration::from_millis(500));
        feed(&p, &clock, 0..5, false);

        // Request on the wire
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(backend.posts(), 1);
        p.reset();

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(rx.recv().await, Some(PipelineEvent::Reset));
        assert!(rx.try_recv().is_err());
        assert!(p.current_result().is_none());
        assert_eq!(p.stats().stale_results, 1);
        assert_eq!(backend.polls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_mid_flight_publishes_nothing() {
        let (p, mut rx, backend, clock) = pipeline(Duration::from_millis(500));
        feed(&p, &clock, 0..5, false);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(backend.posts(), 1);
        p.shutdown();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
        assert!(p.current_result().is_none());
        assert!(p.shared.expiry.lock().is_none());
        assert!(!p.is_transmitting());
        assert_eq!(p.stats().stale_results, 1);
        assert_eq!(backend.polls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_clears_shown_result() {
        let (p, mut rx, _backend, clock) = pipeline(Duration::from_millis(500));
        feed(&p, &clock, 0..5, false);
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(matches!(rx.recv().await, Some(PipelineEvent::Recognized(_))));
        assert!(p.shared.expiry.lock().is_some());

        p.shutdown();
        assert!(p.current_result().is_none());
        assert!(p.shared.expiry.lock().is_none());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(p.stats().expired, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_after_recognition_orders_events() {
        let (p, mut rx, _backend, clock) = pipeline(Duration::from_millis(500));
        feed(&p, &clock, 0..5, false);
        tokio::time::sleep(Duration::from_millis(600)).await;
        p.reset();

        assert!(matches!(rx.recv().await, Some(PipelineEvent::Recognized(_))));
        assert_eq!(rx.recv().await, Some(PipelineEvent::Reset));
        assert!(p.current_result().is_none());
        assert!(p.shared.expiry.lock().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_scenes_skipped() {
        let (p, _rx, _backend, _clock) = pipeline(Duration::ZERO);

        let empty = Detection::new(KeypointSet::empty(), 640, 480, false);
        assert_eq!(p.on_detection(&empty), CycleOutcome::Skipped);

        let malformed = Detection::new(
            KeypointSet::new(vec![Hand::new(vec![Landmark::new(0.5, 0.5, 0.0); 20])]),
            640,
            480,
            false,
        );
        assert_eq!(p.on_detection(&malformed), CycleOutcome::Skipped);

        assert_eq!(p.buffered_frames(), 0);
        assert_eq!(p.stats().skipped, 2);
        assert!(p.overlay().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_near_duplicate_not_admitted() {
        let (p, _rx, _backend, clock) = pipeline(Duration::ZERO);
        feed(&p, &clock, 0..1, false);
        clock.advance(Duration::from_millis(50));
        assert_eq!(
            p.on_detection(&detection(0, false)),
            CycleOutcome::Buffered { admitted: false }
        );
        assert_eq!(p.stats().frames_discarded, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_availability_monitor() {
        let config = PipelineConfig {
            availability_interval: Some(Duration::from_secs(5)),
            ..PipelineConfig::default()
        };
        let (p, mut rx, backend, _clock) = pipeline_with(config, Duration::ZERO);

        assert_eq!(rx.recv().await, Some(PipelineEvent::ServerStatus(true)));
        assert_eq!(p.server_available(), Some(true));

        backend.available.store(false, Ordering::SeqCst);
        assert_eq!(rx.recv().await, Some(PipelineEvent::ServerStatus(false)));
        assert_eq!(p.server_available(), Some(false));

        p.shutdown();
        backend.available.store(true, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_cycles() {
        let (p, _rx, _backend, clock) = pipeline(Duration::ZERO);
        p.shutdown();
        assert_eq!(feed(&p, &clock, 0..1, false), vec![CycleOutcome::Skipped]);
        assert_eq!(p.stats().detections, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_endpoint_keeps_buffer() {
        let (p, _rx, _backend, clock) = pipeline(Duration::ZERO);
        feed(&p, &clock, 0..3, false);
        p.set_endpoint(ServerConfig::new("10.0.0.9", 6000));
        assert_eq!(p.endpoint().url(), "http://10.0.0.9:6000");
        assert_eq!(p.buffered_frames(), 3);
    }

    #[test]
    fn test_no_runtime() {
        let backend = Recognizer::new(Duration::ZERO);
        let transport = TransportClient::with_backend(
            backend,
            ServerConfig::default(),
            TransportConfig::default(),
            Arc::new(SystemClock),
        );
        let result = Pipeline::in_current_runtime(PipelineConfig::default(), transport);
        assert!(matches!(result, Err(GesturaError::RuntimeUnavailable(_))));
    }
}
