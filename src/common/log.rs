//! Structured logging emitting JSON lines.
//!
//! Stage events carry an `ev` field naming the event and, on completion,
//! `dur_ms` with the elapsed wall time.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::common::error::{RiskError, RiskResult};

/// Install the global subscriber. `RUST_LOG` wins over `default_level`.
pub fn init(default_level: &str) -> RiskResult<()> {
    let fallback = format!("extinction_risk={default_level},risk={default_level},warn");
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .map_err(|err| RiskError::invalid_config("RISK_LOG_LEVEL", err.to_string()))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .try_init()
        .map_err(|err| RiskError::internal(format!("failed to init subscriber: {err}")))
}
