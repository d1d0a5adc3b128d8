//! # ragchat-telemetry
//!
//! Logging setup for ragchat binaries and an in-memory span capture
//! for diagnostics and tests.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ragchat_telemetry::{LogFormat, init_telemetry};
//!
//! // Honors RUST_LOG, defaults to `info`
//! init_telemetry("ragchat", LogFormat::Pretty)?;
//! tracing::info!("ready");
//! ```

pub mod capture;

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

pub use capture::{CapturedSpan, SESSION_ID_FIELD, SpanCapture, SpanCaptureLayer};

/// Level used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to install the global subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Output format of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}' (expected 'pretty' or 'json')")),
        }
    }
}

/// Install the global subscriber: an `EnvFilter` from `RUST_LOG` and a
/// stderr fmt layer in the given format.
pub fn init_telemetry(service_name: &str, format: LogFormat) -> Result<(), TelemetryError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    let pretty = (format == LogFormat::Pretty)
        .then(|| fmt::layer().with_target(false).with_writer(std::io::stderr));
    let json = (format == LogFormat::Json)
        .then(|| fmt::layer().json().with_current_span(true).with_writer(std::io::stderr));

    tracing_subscriber::registry().with(env_filter).with(pretty).with(json).try_init()?;

    tracing::debug!(service = service_name, ?format, "telemetry initialized");
    Ok(())
}
