//! Pending dispatch results.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::{Stream, TryStreamExt};

use crate::dispatch::outcome::RequestOutcome;
use crate::dispatch::types::{DispatchError, DispatchResult};
use crate::pool::{BatchResults, PoolResult, TaskHandle};

type PartitionOutput = DispatchResult<Vec<RequestOutcome>>;

fn flatten(result: PoolResult<PartitionOutput>) -> PartitionOutput {
    result.map_err(DispatchError::from).and_then(|outcomes| outcomes)
}

/// One partition in flight; resolves to its outcomes in descriptor order.
#[derive(Debug)]
pub struct PendingResults {
    inner: TaskHandle<PartitionOutput>,
}

impl PendingResults {
    pub(crate) fn new(inner: TaskHandle<PartitionOutput>) -> Self {
        Self { inner }
    }

    /// Block until the partition finishes. Must not be called from inside an
    /// async runtime.
    pub fn wait(self) -> PartitionOutput {
        flatten(self.inner.wait())
    }
}

impl Future for PendingResults {
    type Output = PartitionOutput;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.inner).poll(cx).map(flatten)
    }
}

/// Outcomes of a batch, one item per partition, in submission order.
///
/// A failed partition yields its error in place; later partitions are still
/// yielded.
#[derive(Debug)]
pub struct PartitionResults {
    inner: BatchResults<PartitionOutput>,
}

impl PartitionResults {
    pub(crate) fn new(inner: BatchResults<PartitionOutput>) -> Self {
        Self { inner }
    }

    /// Partitions not yet yielded.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Wait for every partition, stopping at the first failure.
    pub async fn collect_all(self) -> DispatchResult<Vec<Vec<RequestOutcome>>> {
        self.try_collect().await
    }

    /// Consume from synchronous code, blocking on each partition in turn.
    pub fn into_blocking_iter(self) -> impl Iterator<Item = PartitionOutput> {
        self.inner.into_blocking_iter().map(flatten)
    }
}

impl Stream for PartitionResults {
    type Item = PartitionOutput;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner)
            .poll_next(cx)
            .map(|next| next.map(flatten))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
