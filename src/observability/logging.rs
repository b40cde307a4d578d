//! Structured logging setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "request_dispatcher=info";

/// Install a global `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_filter`. Does nothing if a subscriber is already installed.
pub fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_logging(DEFAULT_FILTER);
        init_logging("debug");
        tracing::info!("logging initialised twice without panicking");
    }
}
