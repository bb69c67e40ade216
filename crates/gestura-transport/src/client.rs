//! Transport client
//!
//! Submission flow for one call:
//!
//! ```text
//! validate -> debounce -> [ attempt -> (2xx: done) | (503 / error: backoff) ] x max_retries
//! ```
//!
//! Validation and debounce never touch the network. Failures are reported as
//! a [`SubmitOutcome`], never as an error.

use std::future::Future;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use gestura_core::{
    Clock, ServerConfig, SystemClock, Timestamp, TransportConfig, TranslationResult, FEATURE_LEN, SEQUENCE_FRAMES,
    SEQUENCE_LEN,
};

use crate::{
    parse_translation, Cancellation, Debounce, FeaturesRequest, HttpBackend, HttpReply, RecognizerBackend,
    TransportError, TransportResult,
};

/// Why a payload was refused before any network call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Neither one frame nor one full sequence
    WrongLength(usize),
    /// Fewer non-zero values than the configured ratio
    TooSparse { nonzero: usize, len: usize },
    /// NaN or infinite values cannot be encoded
    NonFinite,
}

/// Outcome of a submission
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Accepted by the recognizer
    Sent { attempts: u32 },
    /// Suppressed, a submission succeeded moments ago
    Debounced,
    /// Refused locally
    Rejected(RejectReason),
    /// Every attempt failed
    Exhausted {
        attempts: u32,
        last_error: Option<TransportError>,
    },
    /// Retry loop stopped by cancellation
    Cancelled { attempts: u32 },
}

impl SubmitOutcome {
    /// Sent or debounced
    pub fn is_success(&self) -> bool {
        matches!(self, SubmitOutcome::Sent { .. } | SubmitOutcome::Debounced)
    }

    /// Network attempts made
    pub fn attempts(&self) -> u32 {
        match self {
            SubmitOutcome::Sent { attempts }
            | SubmitOutcome::Exhausted { attempts, .. }
            | SubmitOutcome::Cancelled { attempts } => *attempts,
            SubmitOutcome::Debounced | SubmitOutcome::Rejected(_) => 0,
        }
    }
}

/// Transport counters
#[derive(Clone, Debug, Default)]
pub struct TransportStats {
    pub attempts: u64,
    pub sent: u64,
    pub debounced: u64,
    pub rejected: u64,
    pub busy_replies: u64,
    pub failed_attempts: u64,
    pub exhausted: u64,
    pub cancelled: u64,
}

/// Check a payload before sending
pub fn validate_features(values: &[f32], min_nonzero_ratio: f32) -> Result<(), RejectReason> {
    if values.len() != FEATURE_LEN && values.len() != SEQUENCE_LEN {
        return Err(RejectReason::WrongLength(values.len()));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(RejectReason::NonFinite);
    }
    let nonzero = values.iter().filter(|v| **v != 0.0).count();
    if (nonzero as f32) < values.len() as f32 * min_nonzero_ratio {
        return Err(RejectReason::TooSparse {
            nonzero,
            len: values.len(),
        });
    }
    Ok(())
}

/// Mean per-value change between consecutive frames of a full sequence
fn sequence_diversity(values: &[f32]) -> Option<f32> {
    if values.len() != SEQUENCE_LEN {
        return None;
    }
    let total: f32 = values
        .chunks_exact(FEATURE_LEN)
        .zip(values.chunks_exact(FEATURE_LEN).skip(1))
        .map(|(a, b)| a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum::<f32>() / FEATURE_LEN as f32)
        .sum();
    Some(total / (SEQUENCE_FRAMES - 1) as f32)
}

/// Client for the remote recognizer
pub struct TransportClient<B = HttpBackend> {
    backend: B,
    config: TransportConfig,
    endpoint: RwLock<ServerConfig>,
    debounce: Debounce,
    clock: Arc<dyn Clock>,
    stats: Mutex<TransportStats>,
}

impl TransportClient<HttpBackend> {
    /// reqwest client on the system clock
    pub fn new(server: ServerConfig, config: TransportConfig) -> TransportResult<Self> {
        let backend = HttpBackend::new(config.request_timeout)?;
        Ok(Self::with_backend(backend, server, config, Arc::new(SystemClock)))
    }
}

impl<B: RecognizerBackend> TransportClient<B> {
    pub fn with_backend(backend: B, server: ServerConfig, config: TransportConfig, clock: Arc<dyn Clock>) -> Self {
        TransportClient {
            backend,
            config,
            endpoint: RwLock::new(server),
            debounce: Debounce::new(),
            clock,
            stats: Mutex::new(TransportStats::default()),
        }
    }

    /// Send features, `true` when sent or debounced
    pub async fn submit_features(&self, values: &[f32], max_retries: u32) -> bool {
        self.submit(values, max_retries).await.is_success()
    }

    pub async fn submit(&self, values: &[f32], max_retries: u32) -> SubmitOutcome {
        self.submit_with_cancel(values, max_retries, &Cancellation::never()).await
    }

    /// Send features, stopping the retry loop if `cancel` fires
    ///
    /// Cancellation is observed before each attempt and during backoff. An
    /// attempt already on the wire runs to completion or timeout.
    pub async fn submit_with_cancel(&self, values: &[f32], max_retries: u32, cancel: &Cancellation) -> SubmitOutcome {
        if let Err(reason) = validate_features(values, self.config.min_nonzero_ratio) {
            tracing::debug!(?reason, len = values.len(), "features rejected locally");
            self.stats.lock().rejected += 1;
            return SubmitOutcome::Rejected(reason);
        }

        let now = self.clock.now();
        let Some(slot) = self.debounce.try_reserve(now, self.config.debounce_interval) else {
            tracing::trace!("submission debounced");
            self.stats.lock().debounced += 1;
            return SubmitOutcome::Debounced;
        };

        let body = match FeaturesRequest::new(values, now).to_json() {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode features");
                return SubmitOutcome::Exhausted {
                    attempts: 0,
                    last_error: Some(TransportError::Request(e.to_string())),
                };
            }
        };
        let url = format!("{}/features", self.endpoint().url());

        tracing::debug!(
            len = values.len(),
            nonzero = values.iter().filter(|v| **v != 0.0).count(),
            diversity = sequence_diversity(values),
            %url,
            "submitting features"
        );

        let mut last_error = None;
        for attempt in 1..=max_retries {
            if cancel.is_cancelled() {
                return self.cancelled(attempt - 1);
            }

            self.stats.lock().attempts += 1;
            match self.call(self.backend.post_json(&url, body.clone())).await {
                Ok(reply) if reply.is_success() => {
                    slot.commit(self.clock.now());
                    self.stats.lock().sent += 1;
                    tracing::debug!(attempt, "features accepted");
                    return SubmitOutcome::Sent { attempts: attempt };
                }
                Ok(reply) if reply.is_busy() => {
                    tracing::warn!(attempt, "recognizer busy, retrying");
                    let mut stats = self.stats.lock();
                    stats.busy_replies += 1;
                    stats.failed_attempts += 1;
                    last_error = Some(TransportError::Status(reply.status));
                }
                Ok(reply) => {
                    tracing::warn!(attempt, status = reply.status, body = %reply.body, "recognizer error");
                    self.stats.lock().failed_attempts += 1;
                    last_error = Some(TransportError::Status(reply.status));
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "feature submission failed");
                    self.stats.lock().failed_attempts += 1;
                    last_error = Some(e);
                }
            }

            if attempt < max_retries && !cancel.sleep(self.config.retry_backoff).await {
                return self.cancelled(attempt);
            }
        }

        tracing::warn!(
            attempts = max_retries,
            last_error = ?last_error,
            "giving up on feature submission"
        );
        self.stats.lock().exhausted += 1;
        SubmitOutcome::Exhausted {
            attempts: max_retries,
            last_error,
        }
    }

    /// Poll the latest recognition
    ///
    /// Any failure yields the empty result stamped with the local time.
    pub async fn get_translation(&self) -> TranslationResult {
        let url = format!("{}/translation", self.endpoint().url());
        let result = self.call(self.backend.get(&url)).await;
        let now = self.clock.now();

        match result {
            Ok(reply) if reply.is_success() => parse_translation(&reply.body, now).unwrap_or_else(|| {
                tracing::debug!(body = %reply.body, "unparseable translation");
                TranslationResult::empty(now)
            }),
            Ok(reply) => {
                tracing::debug!(status = reply.status, "translation poll refused");
                TranslationResult::empty(now)
            }
            Err(e) => {
                tracing::debug!(error = %e, "translation poll failed");
                TranslationResult::empty(now)
            }
        }
    }

    /// Liveness probe against the base URL
    pub async fn check_availability(&self) -> bool {
        let url = self.endpoint().url();
        match self.call(self.backend.get(&url)).await {
            Ok(reply) => reply.is_success(),
            Err(e) => {
                tracing::debug!(error = %e, %url, "recognizer unreachable");
                false
            }
        }
    }

    /// Point at another recognizer; later calls use it
    pub fn set_endpoint(&self, server: ServerConfig) {
        tracing::info!(endpoint = %server.url(), "recognizer endpoint changed");
        *self.endpoint.write() = server;
    }

    pub fn endpoint(&self) -> ServerConfig {
        self.endpoint.read().clone()
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub fn stats(&self) -> TransportStats {
        self.stats.lock().clone()
    }

    pub fn last_success(&self) -> Option<Timestamp> {
        self.debounce.last_success()
    }

    async fn call(&self, request: impl Future<Output = TransportResult<HttpReply>>) -> TransportResult<HttpReply> {
        match tokio::time::timeout(self.config.request_timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout),
        }
    }

    fn cancelled(&self, attempts: u32) -> SubmitOutcome {
        tracing::debug!(attempts, "feature submission cancelled");
        self.stats.lock().cancelled += 1;
        SubmitOutcome::Cancelled { attempts }
    }
}

impl<B> std::fmt::Debug for TransportClient<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportClient")
            .field("endpoint", &*self.endpoint.read())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
