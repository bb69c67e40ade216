//! End-to-end pipeline scenarios
//!
//! Drives a [`Pipeline`] with synthetic detections at a fixed frame rate and
//! collects everything it reports:
//! - Cycle outcomes per detection
//! - Events from the pipeline channel
//! - Final counters

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;

use gestura_core::{ManualClock, PipelineConfig, ServerConfig, Timestamp, TransportConfig};
use gestura_runtime::{CycleOutcome, Pipeline, PipelineEvent, PipelineStats};
use gestura_transport::{RecognizerBackend, TransportClient};

use crate::{ScriptedBackend, SyntheticConfig, SyntheticHands};

// ============================================================================
// SCENARIO CONFIGURATION
// ============================================================================

#[derive(Clone, Debug)]
pub struct ScenarioConfig {
    /// Detections fed to the pipeline
    pub frames: usize,
    /// Time between detections
    pub frame_interval: Duration,
    /// Wait after the last detection before collecting results
    pub settle: Duration,
    /// Flip the camera facing after this many detections
    pub switch_camera_at: Option<usize>,
    pub synthetic: SyntheticConfig,
    pub seed: u64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        ScenarioConfig {
            frames: 30,
            frame_interval: Duration::from_millis(33),
            settle: Duration::from_secs(1),
            switch_camera_at: None,
            synthetic: SyntheticConfig::default(),
            seed: 7,
        }
    }
}

impl ScenarioConfig {
    /// A few windows' worth of frames
    pub fn short() -> Self {
        ScenarioConfig {
            frames: 12,
            ..Self::default()
        }
    }

    /// Two hands for a longer stretch
    pub fn long_signing() -> Self {
        ScenarioConfig {
            frames: 120,
            synthetic: SyntheticConfig::signing(),
            ..Self::default()
        }
    }

    pub fn with_synthetic(mut self, synthetic: SyntheticConfig) -> Self {
        self.synthetic = synthetic;
        self
    }
}

// ============================================================================
// SCENARIO RESULT
// ============================================================================

#[derive(Clone, Debug)]
pub struct ScenarioResult {
    pub outcomes: Vec<CycleOutcome>,
    pub events: Vec<PipelineEvent>,
    pub stats: PipelineStats,
}

impl ScenarioResult {
    pub fn count(&self, outcome: CycleOutcome) -> usize {
        self.outcomes.iter().filter(|o| **o == outcome).count()
    }

    pub fn dispatched(&self) -> usize {
        self.count(CycleOutcome::Dispatched)
    }

    /// Recognized gesture labels, in order
    pub fn recognized(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                PipelineEvent::Recognized(r) => Some(r.gesture.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn resets(&self) -> usize {
        self.events.iter().filter(|e| **e == PipelineEvent::Reset).count()
    }
}

// ============================================================================
// SCENARIO HARNESS
// ============================================================================

/// Feed `config.frames` synthetic detections into `pipeline`
///
/// With a manual clock, it is advanced by the frame interval before every
/// detection so buffer timing follows the simulated frame rate.
pub async fn run_scenario<B: RecognizerBackend>(
    pipeline: &Pipeline<B>,
    events: &mut mpsc::Receiver<PipelineEvent>,
    clock: Option<&ManualClock>,
    config: &ScenarioConfig,
) -> ScenarioResult {
    let mut hands = SyntheticHands::new(config.synthetic.clone(), config.seed);
    let mut outcomes = Vec::with_capacity(config.frames);
    let mut collected = Vec::new();

    for frame in 0..config.frames {
        if Some(frame) == config.switch_camera_at {
            let front = hands.config().front_camera;
            hands.set_front_camera(!front);
        }
        if let Some(clock) = clock {
            clock.advance(config.frame_interval);
        }

        outcomes.push(pipeline.on_detection(&hands.next_detection()));
        tokio::time::sleep(config.frame_interval).await;
        while let Ok(event) = events.try_recv() {
            collected.push(event);
        }
    }

    tokio::time::sleep(config.settle).await;
    while let Ok(event) = events.try_recv() {
        collected.push(event);
    }

    ScenarioResult {
        outcomes,
        events: collected,
        stats: pipeline.stats(),
    }
}

/// Pipeline over a scripted backend on a manual clock
pub fn scripted_pipeline(
    backend: Arc<ScriptedBackend>,
    config: PipelineConfig,
) -> (
    Pipeline<Arc<ScriptedBackend>>,
    mpsc::Receiver<PipelineEvent>,
    Arc<ManualClock>,
) {
    let clock = Arc::new(ManualClock::new(Timestamp::from_millis(1_700_000_000_000)));
    let transport = TransportClient::with_backend(
        backend,
        ServerConfig::default(),
        config.transport.clone(),
        clock.clone(),
    );
    let (pipeline, events) = Pipeline::with_clock(config, transport, Handle::current(), clock.clone());
    (pipeline, events, clock)
}

/// Pipeline configuration without the availability monitor
pub fn quiet_config() -> PipelineConfig {
    PipelineConfig {
        availability_interval: None,
        transport: TransportConfig::default(),
        ..PipelineConfig::default()
    }
}
