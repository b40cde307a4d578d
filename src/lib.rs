//! Parallel HTTP request dispatcher.
//!
//! Drives batches of requests against a single REST backend from a fixed
//! pool of worker threads, timing every request/response exchange and
//! returning results grouped by the partition that produced them.

pub mod client;
pub mod config;
pub mod dispatch;
pub mod net;
pub mod observability;
pub mod pool;
pub mod report;

pub use client::RestClient;
pub use config::DispatcherConfig;
pub use dispatch::{
    partition, DispatchError, DispatchResult, Dispatcher, ErrorKind, Method, RequestDescriptor,
    RequestOutcome,
};
pub use pool::WorkerPool;
