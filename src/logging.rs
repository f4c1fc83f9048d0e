//! Tracing subscriber setup.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Filter used when `RUST_LOG` is unset or unusable.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Build the log filter from `RUST_LOG` directives, falling back to INFO.
pub fn env_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Install the global fmt subscriber.
pub fn init() -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter(rust_log.as_deref()))
        .finish();
    tracing::subscriber::set_global_default(subscriber)
}
