//! Dispatch error definitions.

use thiserror::Error;

use crate::net::TransportError;
use crate::pool::PoolError;

/// Errors that can occur while building or dispatching requests.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A request descriptor failed validation.
    #[error("invalid request descriptor: {0}")]
    InvalidDescriptor(String),

    /// Hostname or port failed validation.
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    /// Partitioning was asked for empty chunks.
    #[error("chunk size must be at least 1, got {0}")]
    InvalidChunkSize(usize),

    /// Input could not be turned into requests.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Worker pool refused or lost the work.
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// The exchange with the backend failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A response body was not the JSON the caller expected.
    #[error("failed to decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Coarse classification of a [`DispatchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid construction parameters; nothing was created.
    Construction,
    /// Work offered to a pool that is shut down.
    Scheduling,
    /// Network or protocol failure.
    Transport,
    /// Invalid call-time input, rejected before any I/O.
    Input,
    /// The job died on its worker.
    Worker,
    /// Response body did not decode.
    Decode,
}

impl DispatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::InvalidDescriptor(_) | DispatchError::InvalidTarget(_) => {
                ErrorKind::Construction
            }
            DispatchError::InvalidChunkSize(_) | DispatchError::InvalidInput(_) => ErrorKind::Input,
            DispatchError::Pool(PoolError::ShutDown) => ErrorKind::Scheduling,
            DispatchError::Pool(PoolError::InvalidWorkerCount(_) | PoolError::Spawn(_)) => {
                ErrorKind::Construction
            }
            DispatchError::Pool(PoolError::Panicked(_) | PoolError::WorkerLost) => ErrorKind::Worker,
            DispatchError::Transport(_) => ErrorKind::Transport,
            DispatchError::Decode { .. } => ErrorKind::Decode,
        }
    }
}

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;
