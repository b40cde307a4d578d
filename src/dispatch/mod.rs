//! Request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! caller builds RequestDescriptors (descriptor.rs, validated on construction)
//!     → partition.rs (optional: contiguous chunks, order preserved)
//!     → dispatcher.rs
//!         prepare every request up front (no I/O on bad input)
//!         submit one job per partition to the worker pool
//!     → on the worker: one connection, requests sent in order,
//!       each timed into a RequestOutcome (outcome.rs)
//!     → handle.rs (PendingResults / PartitionResults) back to the caller,
//!       in partition submission order
//! ```
//!
//! # Design Decisions
//! - Target and worker count are validated once, at construction
//! - No intra-partition parallelism; partitions never share a connection
//! - Transport failures are surfaced unchanged, never retried
//! - A failing partition does not cancel its siblings

pub mod descriptor;
pub mod dispatcher;
pub mod handle;
pub mod outcome;
pub mod partition;
pub mod types;

pub use descriptor::{Method, Payload, RequestDescriptor};
pub use dispatcher::{Dispatcher, Target, CLIENT_ID};
pub use handle::{PartitionResults, PendingResults};
pub use outcome::RequestOutcome;
pub use partition::{even_chunk_size, partition, partition_evenly};
pub use types::{DispatchError, DispatchResult, ErrorKind};
