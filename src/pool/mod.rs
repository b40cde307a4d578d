//! Worker pool subsystem.
//!
//! # Data Flow
//! ```text
//! caller: submit(f, args) / map(f, inputs)
//!     → job boxed as a Send future, pushed onto the shared FIFO queue
//!     → worker.rs (N OS threads, each with its own current-thread runtime)
//!         pull the next job, run it to completion, send result via oneshot
//!     → handle.rs (TaskHandle / BatchResults) hand results back in
//!       submission order
//! ```
//!
//! # Design Decisions
//! - Fixed worker count chosen at construction, never resized
//! - No work stealing: one FIFO queue, workers take jobs in order
//! - Workers do not depend on the caller's runtime; a current-thread caller
//!   still gets true parallel execution
//! - A panicking job is reported through its handle; the worker survives
//! - Shutdown closes the queue, drains queued work and joins every thread

pub mod handle;
pub mod types;
pub mod worker;

pub use handle::{BatchResults, TaskHandle};
pub use types::{PoolError, PoolResult};
pub use worker::WorkerPool;
