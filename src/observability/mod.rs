//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! pool + dispatch produce:
//!     → tracing events (worker lifecycle, connections, request timings)
//!     → metrics.rs (counters, latency histogram)
//!
//! Consumers:
//!     → logging.rs installs the subscriber (binary and tests only)
//!     → metrics.rs installs a Prometheus exporter when asked to
//! ```
//!
//! # Design Decisions
//! - The library emits events but never installs a subscriber or recorder
//! - Metric updates are no-ops until a recorder exists

pub mod logging;
pub mod metrics;
