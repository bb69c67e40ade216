//! Pipeline configuration
//!
//! Every timing and threshold constant of the pipeline lives here so it can be
//! retuned per deployment or recognizer model.

use std::time::Duration;

use crate::{GesturaError, GesturaResult, SEQUENCE_FRAMES};

/// Default recognizer host
pub const DEFAULT_SERVER_HOST: &str = "192.168.0.103";

/// Default recognizer port
pub const DEFAULT_SERVER_PORT: u16 = 5000;

/// Sequence buffer configuration
#[derive(Clone, Debug)]
pub struct SequenceConfig {
    /// Maximum buffered frames (and frames per extracted sequence)
    pub capacity: usize,
    /// Frames required before a sequence can be extracted
    pub min_frames: usize,
    /// A window older than this is discarded on the next admission
    pub window_timeout: Duration,
    /// Minimum weighted difference for a frame to count as new motion
    pub difference_threshold: f32,
    /// A frame is admitted regardless of difference after this long
    pub starvation_interval: Duration,
    /// Original frames kept as seed for the next window after extraction
    pub carry_over: usize,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        SequenceConfig {
            capacity: SEQUENCE_FRAMES,
            min_frames: 5,
            window_timeout: Duration::from_millis(5000),
            difference_threshold: 0.05,
            starvation_interval: Duration::from_millis(300),
            carry_over: 2,
        }
    }
}

impl SequenceConfig {
    /// Shorter windows for fast signers
    pub fn responsive() -> Self {
        SequenceConfig {
            window_timeout: Duration::from_millis(3000),
            difference_threshold: 0.03,
            starvation_interval: Duration::from_millis(200),
            ..Self::default()
        }
    }
}

/// Transport client configuration
#[derive(Clone, Debug)]
pub struct TransportConfig {
    /// Attempts per submission
    pub max_retries: u32,
    /// Delay between attempts (also applied after a 503)
    pub retry_backoff: Duration,
    /// Submissions this soon after a success are short-circuited
    pub debounce_interval: Duration,
    /// Per-attempt connect + request timeout
    pub request_timeout: Duration,
    /// Minimum share of non-zero values for a submission to be sent
    pub min_nonzero_ratio: f32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            max_retries: 3,
            retry_backoff: Duration::from_millis(300),
            debounce_interval: Duration::from_millis(50),
            request_timeout: Duration::from_secs(3),
            min_nonzero_ratio: 0.1,
        }
    }
}

impl TransportConfig {
    /// More attempts and longer timeouts for congested links
    pub fn patient() -> Self {
        TransportConfig {
            max_retries: 5,
            retry_backoff: Duration::from_millis(500),
            request_timeout: Duration::from_secs(5),
            ..Self::default()
        }
    }
}

/// Recognizer endpoint
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: DEFAULT_SERVER_HOST.to_string(),
            port: DEFAULT_SERVER_PORT,
        }
    }
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        ServerConfig {
            host: host.into(),
            port,
        }
    }

    /// Parse `host:port`, with or without an `http://` prefix
    ///
    /// Any other scheme is rejected: the recognizer speaks plain HTTP.
    pub fn parse(s: &str) -> GesturaResult<Self> {
        let mut trimmed = s.trim();
        if let Some((scheme, rest)) = trimmed.split_once("://") {
            if !scheme.eq_ignore_ascii_case("http") {
                return Err(GesturaError::InvalidEndpoint(format!("unsupported scheme in {s:?}")));
            }
            trimmed = rest;
        }
        let trimmed = trimmed.trim_end_matches('/');
        if trimmed.contains('/') {
            return Err(GesturaError::InvalidEndpoint(format!("unexpected path in {s:?}")));
        }
        let (host, port) = trimmed
            .rsplit_once(':')
            .ok_or_else(|| GesturaError::InvalidEndpoint(format!("missing port in {s:?}")))?;
        if host.is_empty() {
            return Err(GesturaError::InvalidEndpoint(format!("missing host in {s:?}")));
        }
        let port: u16 = port
            .parse()
            .map_err(|e| GesturaError::InvalidEndpoint(format!("bad port in {s:?}: {e}")))?;
        Ok(ServerConfig::new(host, port))
    }

    /// Base URL, `http://host:port`
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn reset_to_default(&mut self) {
        *self = ServerConfig::default();
    }
}

/// Orchestrator configuration
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub sequence: SequenceConfig,
    pub transport: TransportConfig,
    pub server: ServerConfig,
    /// How long a recognized gesture stays displayed
    pub display_lifetime: Duration,
    /// Liveness probe period, `None` disables the monitor
    pub availability_interval: Option<Duration>,
    /// Capacity of the event channel
    pub event_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            sequence: SequenceConfig::default(),
            transport: TransportConfig::default(),
            server: ServerConfig::default(),
            display_lifetime: Duration::from_millis(3000),
            availability_interval: Some(Duration::from_secs(5)),
            event_capacity: 64,
        }
    }
}

impl PipelineConfig {
    pub fn with_server(mut self, server: ServerConfig) -> Self {
        self.server = server;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_defaults() {
        let seq = SequenceConfig::default();
        assert_eq!(seq.capacity, 10);
        assert_eq!(seq.min_frames, 5);
        assert_eq!(seq.window_timeout, Duration::from_millis(5000));
        assert_eq!(seq.starvation_interval, Duration::from_millis(300));

        let transport = TransportConfig::default();
        assert_eq!(transport.max_retries, 3);
        assert_eq!(transport.debounce_interval, Duration::from_millis(50));
        assert_eq!(transport.request_timeout, Duration::from_secs(3));

        let pipeline = PipelineConfig::default();
        assert_eq!(pipeline.display_lifetime, Duration::from_millis(3000));
    }

    #[test]
    fn test_server_url() {
        let server = ServerConfig::default();
        assert_eq!(server.url(), "http://192.168.0.103:5000");
    }

    #[test]
    fn test_server_parse() {
        let s = ServerConfig::parse("10.0.0.2:8080").unwrap();
        assert_eq!(s, ServerConfig::new("10.0.0.2", 8080));

        let s = ServerConfig::parse("http://localhost:5000/").unwrap();
        assert_eq!(s.url(), "http://localhost:5000");

        assert!(ServerConfig::parse("localhost").is_err());
        assert!(ServerConfig::parse(":5000").is_err());
        assert!(ServerConfig::parse("host:notaport").is_err());
    }

    #[test]
    fn test_server_parse_rejects_other_schemes() {
        assert!(matches!(
            ServerConfig::parse("https://host:5000"),
            Err(GesturaError::InvalidEndpoint(_))
        ));
        assert!(ServerConfig::parse("ws://host:5000").is_err());
        assert!(ServerConfig::parse("http://host:5000/features").is_err());
        assert_eq!(
            ServerConfig::parse("HTTP://host:5000").unwrap(),
            ServerConfig::new("host", 5000)
        );
    }

    #[test]
    fn test_responsive_preset() {
        let fast = SequenceConfig::responsive();
        let base = SequenceConfig::default();
        assert!(fast.window_timeout < base.window_timeout);
        assert!(fast.starvation_interval < base.starvation_interval);
        assert!(fast.difference_threshold < base.difference_threshold);
        assert_eq!(fast.capacity, base.capacity);
        assert_eq!(fast.min_frames, base.min_frames);
    }

    #[test]
    fn test_patient_preset() {
        let slow = TransportConfig::patient();
        assert_eq!(slow.max_retries, 5);
        assert!(slow.request_timeout > TransportConfig::default().request_timeout);
        assert_eq!(slow.debounce_interval, Duration::from_millis(50));
    }

    proptest! {
        #[test]
        fn prop_server_url_parses_back(host in "[a-z][a-z0-9-]{0,12}(\\.[a-z0-9]{1,8}){0,3}", port in any::<u16>()) {
            let server = ServerConfig::new(host.clone(), port);
            prop_assert_eq!(ServerConfig::parse(&server.url()).unwrap(), server.clone());
            prop_assert_eq!(ServerConfig::parse(&format!("{host}:{port}")).unwrap(), server);
        }
    }

    #[test]
    fn test_server_reset() {
        let mut s = ServerConfig::new("example", 1);
        s.reset_to_default();
        assert_eq!(s, ServerConfig::default());
    }
}
