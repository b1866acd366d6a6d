//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::EngineError;

/// Install a compact fmt subscriber for the whole process.
///
/// `RUST_LOG` wins over `default_filter` (e.g. `"kairos_search=debug,info"`).
/// Calling this a second time returns an error.
pub fn init_tracing(default_filter: &str) -> Result<(), EngineError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|e| EngineError::Logging(format!("invalid log filter: {e}")))?;

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| EngineError::Logging(e.to_string()))
}
