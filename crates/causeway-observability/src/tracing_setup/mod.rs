//! Tracing setup: structured logging with event helpers.
//!
//! [`init_tracing`] always writes JSON lines. [`init_tracing_from_config`]
//! writes human-readable lines unless `json_logs` is set in the config.

pub mod events;

use causeway_core::config::defaults::LOG_FILTER_ENV;
use causeway_core::config::ObservabilityConfig;
use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber with JSON output, regardless of config.
///
/// Respects the `CAUSEWAY_LOG` environment variable for filtering.
/// Defaults to `info` level if not set. Does nothing if a global
/// subscriber is already installed.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .json()
        .try_init();
}

/// Initialize tracing from an [`ObservabilityConfig`].
///
/// Output is plain text by default and JSON only when `json_logs` is true.
///
/// `CAUSEWAY_LOG` still takes precedence over the configured level so a
/// single run can be made more verbose without editing config files.
pub fn init_tracing_from_config(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let _ = if config.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
