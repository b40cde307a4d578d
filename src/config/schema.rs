//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::observability::logging::DEFAULT_FILTER;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Backend every request is sent to.
    pub target: TargetConfig,

    /// Worker pool sizing and partitioning.
    pub pool: PoolConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

/// Backend host and port.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TargetConfig {
    pub hostname: String,
    pub port: u16,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            hostname: "127.0.0.1".to_string(),
            port: 8081,
        }
    }
}

/// Worker pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of worker threads.
    pub workers: usize,

    /// Requests per partition. When unset, requests are spread evenly over
    /// the workers.
    pub chunk_size: Option<usize>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            chunk_size: None,
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Filter used when `RUST_LOG` is unset.
    pub log_filter: String,

    /// Address for the Prometheus exporter; disabled when unset.
    pub metrics_address: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_FILTER.to_string(),
            metrics_address: None,
        }
    }
}
