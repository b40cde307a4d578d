//! Configuration validation.
//!
//! Pure function over a parsed config that reports every problem at once
//! rather than stopping at the first.

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::DispatcherConfig;

/// One semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub fn validate_config(config: &DispatcherConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.target.hostname.trim().is_empty() {
        errors.push(ValidationError {
            field: "target.hostname",
            message: "must not be blank".to_string(),
        });
    }
    if config.target.port == 0 {
        errors.push(ValidationError {
            field: "target.port",
            message: "must be at least 1".to_string(),
        });
    }
    if config.pool.workers == 0 {
        errors.push(ValidationError {
            field: "pool.workers",
            message: "must be at least 1".to_string(),
        });
    }
    if config.pool.chunk_size == Some(0) {
        errors.push(ValidationError {
            field: "pool.chunk_size",
            message: "must be at least 1".to_string(),
        });
    }
    if let Some(addr) = &config.observability.metrics_address {
        if addr.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError {
                field: "observability.metrics_address",
                message: format!("{addr:?} is not a socket address"),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
