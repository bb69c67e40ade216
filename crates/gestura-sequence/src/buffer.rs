//! Sequence Buffer - bounded frame history
//!
//! Frames arrive from the detector thread; sequences are extracted from the
//! I/O side. All state sits behind one mutex and no operation holds it longer
//! than a copy of at most `capacity` frames.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use gestura_core::{Clock, FeatureVector, Sequence, SequenceConfig, SystemClock, Timestamp};
use gestura_features::Noise;

use crate::frame_difference;

/// Result of offering a frame to the buffer
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AdmitOutcome {
    /// Frame appended
    Admitted {
        /// Buffer length after admission
        len: usize,
        /// The window had expired and was cleared first
        window_reset: bool,
    },
    /// Too similar to the last admitted frame
    Discarded { score: f32 },
}

impl AdmitOutcome {
    pub fn is_admitted(&self) -> bool {
        matches!(self, AdmitOutcome::Admitted { .. })
    }
}

/// Buffer counters
#[derive(Clone, Debug, Default)]
pub struct BufferStats {
    pub admitted: u64,
    pub discarded: u64,
    pub evicted: u64,
    pub window_resets: u64,
    pub sequences_extracted: u64,
    pub clears: u64,
}

struct BufferState {
    frames: VecDeque<FeatureVector>,
    window_start: Timestamp,
    last_admitted: Timestamp,
    noise: Noise,
    stats: BufferStats,
}

impl BufferState {
    fn reset_window(&mut self, now: Timestamp) {
        self.frames.clear();
        self.window_start = now;
    }
}

/// Sequence Buffer
pub struct SequenceBuffer {
    state: Mutex<BufferState>,
    clock: Arc<dyn Clock>,
    config: SequenceConfig,
}

impl SequenceBuffer {
    /// Create a buffer on the system clock
    pub fn new(config: SequenceConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock), Noise::from_entropy())
    }

    /// Create a buffer with an explicit clock and noise source
    pub fn with_clock(config: SequenceConfig, clock: Arc<dyn Clock>, noise: Noise) -> Self {
        let now = clock.now();
        SequenceBuffer {
            state: Mutex::new(BufferState {
                frames: VecDeque::with_capacity(config.capacity + 1),
                window_start: now,
                last_admitted: now,
                noise,
                stats: BufferStats::default(),
            }),
            clock,
            config,
        }
    }

    /// Offer a frame
    ///
    /// Expired windows are cleared first. The frame is admitted when the
    /// buffer is empty, when it differs from the last admitted frame by more
    /// than the difference threshold, or when the starvation interval has
    /// passed since the last admission.
    pub fn add_frame(&self, frame: &FeatureVector) -> AdmitOutcome {
        let now = self.clock.now();
        let mut st = self.state.lock();

        let window_reset = now.saturating_since(st.window_start) > self.config.window_timeout;
        if window_reset {
            tracing::debug!(
                dropped = st.frames.len(),
                "sequence window expired, starting a new one"
            );
            st.reset_window(now);
            st.stats.window_resets += 1;
        }

        if let Some(last) = st.frames.back() {
            let difference = frame_difference(last, frame);
            let starving = now.saturating_since(st.last_admitted) >= self.config.starvation_interval;

            if difference <= self.config.difference_threshold && !starving {
                tracing::trace!(score = difference, "frame discarded as near-duplicate");
                st.stats.discarded += 1;
                return AdmitOutcome::Discarded { score: difference };
            }
        }

        let noisy = st.noise.perturb_vector(frame);
        st.frames.push_back(noisy);
        st.last_admitted = now;
        st.stats.admitted += 1;

        while st.frames.len() > self.config.capacity {
            st.frames.pop_front();
            st.stats.evicted += 1;
        }

        AdmitOutcome::Admitted {
            len: st.frames.len(),
            window_reset,
        }
    }

    /// Enough frames buffered for a sequence
    pub fn is_ready(&self) -> bool {
        self.state.lock().frames.len() >= self.config.min_frames
    }

    /// Take a padded sequence out of the buffer
    ///
    /// Returns [`Sequence::empty`] and leaves the buffer untouched when fewer
    /// than `min_frames` are buffered. Otherwise the buffered frames are padded
    /// to `capacity` with perturbed copies of the last one; afterwards only
    /// the last `carry_over` original frames remain and the window restarts.
    pub fn extract_sequence(&self) -> Sequence {
        let now = self.clock.now();
        let mut st = self.state.lock();

        if st.frames.len() < self.config.min_frames {
            return Sequence::empty();
        }
        let Some(last) = st.frames.back().cloned() else {
            return Sequence::empty();
        };

        let mut frames: Vec<FeatureVector> = st.frames.iter().cloned().collect();
        let original = frames.len();
        while frames.len() < self.config.capacity {
            let padded = st.noise.perturb_vector(&last);
            frames.push(padded);
        }
        let sequence = Sequence::from_frames(&frames);

        let keep = self.config.carry_over.min(original);
        st.frames.drain(..original - keep);
        st.window_start = now;
        st.stats.sequences_extracted += 1;

        tracing::debug!(
            original,
            padded = frames.len() - original,
            carried = keep,
            "sequence extracted"
        );

        sequence
    }

    /// Empty the buffer and restart the window
    pub fn clear(&self) {
        let now = self.clock.now();
        let mut st = self.state.lock();
        st.reset_window(now);
        st.stats.clears += 1;
    }

    pub fn len(&self) -> usize {
        self.state.lock().frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().frames.is_empty()
    }

    /// Copy of the buffered frames, oldest first
    pub fn snapshot(&self) -> Vec<FeatureVector> {
        self.state.lock().frames.iter().cloned().collect()
    }

    /// Time since the current window started
    pub fn window_age(&self) -> Duration {
        let now = self.clock.now();
        now.saturating_since(self.state.lock().window_start)
    }

    pub fn stats(&self) -> BufferStats {
        self.state.lock().stats.clone()
    }

    pub fn config(&self) -> &SequenceConfig {
        &self.config
    }
}

impl std::fmt::Debug for SequenceBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceBuffer")
            .field("len", &self.len())
            .field("config", &self.config)
            .finish()
    }
}
