//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (read & deserialize)
//!     → validation.rs (semantic checks, all errors reported)
//!     → DispatcherConfig (validated, immutable)
//!     → CLI builds the Dispatcher from it
//! ```
//!
//! # Design Decisions
//! - Only the binary reads files; the pool and dispatcher take plain values
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{DispatcherConfig, ObservabilityConfig, PoolConfig, TargetConfig};
pub use validation::{validate_config, ValidationError};
