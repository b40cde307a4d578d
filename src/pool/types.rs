//! Worker pool error definitions.

use thiserror::Error;

/// Errors surfaced by the worker pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Work was offered after `shutdown` closed the queue.
    #[error("worker pool is shut down; no further work can be scheduled")]
    ShutDown,

    /// The pool was asked for zero workers.
    #[error("worker count must be at least 1, got {0}")]
    InvalidWorkerCount(usize),

    /// A worker thread or its runtime could not be created.
    #[error("failed to start worker: {0}")]
    Spawn(#[from] std::io::Error),

    /// The job panicked while running on a worker.
    #[error("job panicked on worker: {0}")]
    Panicked(String),

    /// The job was dropped before producing a result.
    #[error("worker dropped the job before it produced a result")]
    WorkerLost,
}

/// Result type for worker pool operations.
pub type PoolResult<T> = Result<T, PoolError>;

/// Render a caught panic payload as text.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
