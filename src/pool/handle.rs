//! Handles to pending work.
//!
//! # Responsibilities
//! - `TaskHandle`: one pending job, awaitable or blocking-waitable once
//! - `BatchResults`: a forward-only stream over a batch of handles, yielding
//!   in submission order and suspending on whichever job is next in line

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use tokio::sync::oneshot;

use crate::pool::types::{PoolError, PoolResult};

/// A reference to one job scheduled on the pool.
///
/// Resolves to the job's output, or to the failure that prevented it from
/// producing one. Dropping the handle does not cancel the job.
#[derive(Debug)]
pub struct TaskHandle<T> {
    rx: oneshot::Receiver<PoolResult<T>>,
}

impl<T> TaskHandle<T> {
    pub(crate) fn new(rx: oneshot::Receiver<PoolResult<T>>) -> Self {
        Self { rx }
    }

    /// Block the current thread until the job finishes.
    ///
    /// # Panics
    /// Panics when called from inside an async runtime; await the handle
    /// there instead.
    pub fn wait(self) -> PoolResult<T> {
        self.rx
            .blocking_recv()
            .unwrap_or_else(|_| Err(PoolError::WorkerLost))
    }
}

impl<T> Future for TaskHandle<T> {
    type Output = PoolResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or_else(|_| Err(PoolError::WorkerLost)))
    }
}

/// Results of a `WorkerPool::map` call, in submission order.
///
/// A slow job at the front holds back every later result, even ones that
/// already completed.
#[derive(Debug)]
pub struct BatchResults<T> {
    pending: VecDeque<TaskHandle<T>>,
}

impl<T> BatchResults<T> {
    pub(crate) fn new(handles: Vec<TaskHandle<T>>) -> Self {
        Self {
            pending: handles.into(),
        }
    }

    /// Number of results not yet yielded.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Consume the batch from synchronous code, blocking on each result in
    /// turn. Same runtime restriction as [`TaskHandle::wait`].
    pub fn into_blocking_iter(self) -> impl Iterator<Item = PoolResult<T>> {
        self.pending.into_iter().map(TaskHandle::wait)
    }
}

impl<T> Stream for BatchResults<T> {
    type Item = PoolResult<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let Some(front) = self.pending.front_mut() else {
            return Poll::Ready(None);
        };

        match Pin::new(front).poll(cx) {
            Poll::Ready(result) => {
                self.pending.pop_front();
                Poll::Ready(Some(result))
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.pending.len(), Some(self.pending.len()))
    }
}
