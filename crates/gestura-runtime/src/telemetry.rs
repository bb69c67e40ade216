//! Logging setup
//!
//! Library crates only emit `tracing` events. Binaries call
//! [`init_telemetry`] once to install a subscriber.

use tracing_subscriber::EnvFilter;

use gestura_core::{GesturaError, GesturaResult};

/// Subscriber configuration
#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    /// `EnvFilter` directives, overridden by `RUST_LOG` when set
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        TelemetryConfig {
            filter: "info".to_string(),
            json: false,
        }
    }
}

/// Install the global subscriber
///
/// Returns `Ok(false)` when a subscriber was already installed.
pub fn init_telemetry(config: &TelemetryConfig) -> GesturaResult<bool> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.is_empty() => EnvFilter::try_new(directives),
        _ => EnvFilter::try_new(&config.filter),
    }
    .map_err(|e| GesturaError::Telemetry(e.to_string()))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    Ok(installed.is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_noop() {
        let config = TelemetryConfig::default();
        let _ = init_telemetry(&config);
        assert_eq!(init_telemetry(&config).ok(), Some(false));
    }

    #[test]
    fn test_bad_filter_rejected() {
        if std::env::var(EnvFilter::DEFAULT_ENV).is_ok() {
            return;
        }
        let config = TelemetryConfig {
            filter: "gestura=notalevel".to_string(),
            json: false,
        };
        assert!(matches!(init_telemetry(&config), Err(GesturaError::Telemetry(_))));
    }
}
