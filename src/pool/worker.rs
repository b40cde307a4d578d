//! Fixed-size pool of worker threads.
//!
//! # Responsibilities
//! - Start N OS threads, each driving its own current-thread runtime
//! - Accept jobs (`submit`, `map`) without blocking the caller
//! - Reject work deterministically once shut down
//! - Drain and join every worker on shutdown

use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::thread;

use arc_swap::ArcSwapOption;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::sync::{mpsc, oneshot};

use crate::observability::metrics;
use crate::pool::handle::{BatchResults, TaskHandle};
use crate::pool::types::{panic_message, PoolError, PoolResult};

/// A unit of work as seen by a worker thread.
type Job = BoxFuture<'static, ()>;

type JobQueue = mpsc::UnboundedSender<Job>;

/// Pool of independent worker threads sharing one FIFO job queue.
pub struct WorkerPool {
    workers: usize,
    /// `None` once shut down.
    queue: ArcSwapOption<JobQueue>,
    /// Held for the whole join, so concurrent `shutdown` calls all wait.
    threads: tokio::sync::Mutex<Vec<thread::JoinHandle<()>>>,
}

impl WorkerPool {
    /// Start a pool with `workers` threads.
    pub fn new(workers: usize) -> PoolResult<Self> {
        if workers == 0 {
            return Err(PoolError::InvalidWorkerCount(workers));
        }

        let (tx, rx) = mpsc::unbounded_channel::<Job>();
        let rx = Arc::new(tokio::sync::Mutex::new(rx));

        // On error `tx` is dropped, so threads already started drain and exit.
        let mut threads = Vec::with_capacity(workers);
        for id in 0..workers {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            let rx = rx.clone();
            let handle = thread::Builder::new()
                .name(format!("dispatch-worker-{id}"))
                .spawn(move || run_worker(id, runtime, rx))?;
            threads.push(handle);
        }

        tracing::info!(workers, "Worker pool started");

        Ok(Self {
            workers,
            queue: ArcSwapOption::from_pointee(tx),
            threads: tokio::sync::Mutex::new(threads),
        })
    }

    /// Number of worker threads.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// True once `shutdown` has been called.
    pub fn is_shut_down(&self) -> bool {
        self.queue.load().is_none()
    }

    /// Schedule `f(args)` on the next free worker.
    pub fn submit<A, F, Fut>(&self, f: F, args: A) -> PoolResult<TaskHandle<Fut::Output>>
    where
        A: Send + 'static,
        F: FnOnce(A) -> Fut + Send + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
    {
        let guard = self.queue.load();
        let Some(queue) = &*guard else {
            return Err(PoolError::ShutDown);
        };
        enqueue(queue, f, args)
    }

    /// Schedule `f` once per input and return the results in input order.
    ///
    /// Either every input is scheduled or none is.
    pub fn map<A, F, Fut, I>(&self, f: F, inputs: I) -> PoolResult<BatchResults<Fut::Output>>
    where
        I: IntoIterator<Item = A>,
        A: Send + 'static,
        F: Fn(A) -> Fut + Clone + Send + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
    {
        let guard = self.queue.load();
        let Some(queue) = &*guard else {
            return Err(PoolError::ShutDown);
        };

        let handles = inputs
            .into_iter()
            .map(|args| enqueue(queue, f.clone(), args))
            .collect::<PoolResult<Vec<_>>>()?;

        Ok(BatchResults::new(handles))
    }

    /// Stop accepting work, let queued and running jobs finish, then join
    /// every worker thread.
    pub async fn shutdown(&self) {
        if self.queue.swap(None).is_some() {
            tracing::info!(workers = self.workers, "Worker pool shutting down");
        }

        let mut guard = self.threads.lock().await;
        let threads = std::mem::take(&mut *guard);
        if threads.is_empty() {
            return;
        }

        let joined = tokio::task::spawn_blocking(move || {
            for handle in threads {
                if handle.join().is_err() {
                    tracing::error!("Worker thread terminated abnormally");
                }
            }
        })
        .await;
        drop(guard);

        if let Err(e) = joined {
            tracing::error!(error = %e, "Failed to join worker threads");
        }

        tracing::info!("Worker pool stopped");
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers)
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

fn enqueue<A, F, Fut>(queue: &JobQueue, f: F, args: A) -> PoolResult<TaskHandle<Fut::Output>>
where
    A: Send + 'static,
    F: FnOnce(A) -> Fut + Send + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: Send + 'static,
{
    let (tx, rx) = oneshot::channel();

    let job: Job = Box::pin(async move {
        let outcome = AssertUnwindSafe(async move { f(args).await })
            .catch_unwind()
            .await;
        let result = outcome.map_err(|payload| PoolError::Panicked(panic_message(payload.as_ref())));
        // Receiver may have been dropped; the job still ran.
        let _ = tx.send(result);
    });

    queue.send(job).map_err(|_| PoolError::ShutDown)?;
    metrics::record_job_scheduled();

    Ok(TaskHandle::new(rx))
}

fn run_worker(
    id: usize,
    runtime: tokio::runtime::Runtime,
    rx: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Job>>>,
) {
    tracing::debug!(worker = id, "Worker started");

    runtime.block_on(async move {
        loop {
            let job = { rx.lock().await.recv().await };
            match job {
                Some(job) => job.await,
                None => break,
            }
        }
    });

    tracing::debug!(worker = id, "Worker exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Barrier;
    use std::time::Duration;

    async fn square(x: u64) -> u64 {
        x * x
    }

    #[test]
    fn test_zero_workers_rejected() {
        let err = WorkerPool::new(0).unwrap_err();
        assert!(matches!(err, PoolError::InvalidWorkerCount(0)));
    }

    #[tokio::test]
    async fn test_submit_returns_result() {
        let pool = WorkerPool::new(2).unwrap();
        assert_eq!(pool.workers(), 2);

        let handle = pool.submit(square, 7).unwrap();
        assert_eq!(handle.await.unwrap(), 49);

        let handle = pool.submit(|(x, y): (i32, &'static str)| async move { (x, y) }, (1, "a")).unwrap();
        assert_eq!(handle.await.unwrap(), (1, "a"));

        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_map_preserves_submission_order() {
        let pool = WorkerPool::new(3).unwrap();

        // Earlier inputs sleep longer so completion order is reversed.
        let batch = pool
            .map(
                |x: u64| async move {
                    tokio::time::sleep(Duration::from_millis(30 * (3 - x))).await;
                    x * 10
                },
                vec![0, 1, 2],
            )
            .unwrap();

        let results: Vec<u64> = batch.map(|r| r.unwrap()).collect().await;
        assert_eq!(results, vec![0, 10, 20]);

        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_map_empty_input() {
        let pool = WorkerPool::new(1).unwrap();
        let batch = pool.map(square, Vec::new()).unwrap();
        assert!(batch.is_empty());
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_workers_run_in_parallel() {
        // Each job blocks its thread until all three have arrived; this can
        // only complete if three workers run at the same time, even though
        // the test itself is on a current-thread runtime.
        let pool = WorkerPool::new(3).unwrap();
        let barrier = Arc::new(Barrier::new(3));

        let batch = pool
            .map(
                move |i: usize| {
                    let barrier = barrier.clone();
                    async move {
                        barrier.wait();
                        i
                    }
                },
                vec![0, 1, 2],
            )
            .unwrap();

        let results: Vec<usize> = batch.map(|r| r.unwrap()).collect().await;
        assert_eq!(results, vec![0, 1, 2]);

        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_panic_reported_and_worker_survives() {
        let pool = WorkerPool::new(1).unwrap();

        let handle = pool
            .submit(
                |x: u64| async move {
                    if x > 0 {
                        panic!("job exploded");
                    }
                    x
                },
                1,
            )
            .unwrap();
        let err = handle.await.unwrap_err();
        match err {
            PoolError::Panicked(msg) => assert!(msg.contains("job exploded")),
            other => panic!("unexpected error: {other:?}"),
        }

        // Same single worker still serves jobs.
        assert_eq!(pool.submit(square, 3).unwrap().await.unwrap(), 9);

        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_scheduling_after_shutdown_fails() {
        let pool = WorkerPool::new(2).unwrap();
        pool.shutdown().await;

        assert!(pool.is_shut_down());
        assert!(matches!(pool.submit(square, 2), Err(PoolError::ShutDown)));
        assert!(matches!(pool.map(square, vec![1, 2]), Err(PoolError::ShutDown)));

        // A second shutdown is harmless.
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_in_flight_work() {
        let pool = WorkerPool::new(1).unwrap();
        let done = Arc::new(AtomicBool::new(false));

        let flag = done.clone();
        let _handle = pool
            .submit(
                move |_: ()| async move {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    flag.store(true, Ordering::SeqCst);
                },
                (),
            )
            .unwrap();

        pool.shutdown().await;
        assert!(done.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_concurrent_shutdowns_both_wait() {
        let pool = WorkerPool::new(1).unwrap();
        let done = Arc::new(AtomicBool::new(false));

        let flag = done.clone();
        let _handle = pool
            .submit(
                move |_: ()| async move {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    flag.store(true, Ordering::SeqCst);
                },
                (),
            )
            .unwrap();

        let first = async {
            pool.shutdown().await;
            done.load(Ordering::SeqCst)
        };
        let second = async {
            pool.shutdown().await;
            done.load(Ordering::SeqCst)
        };
        let (first, second) = tokio::join!(first, second);
        assert!(first);
        assert!(second);
    }

    #[test]
    fn test_blocking_wait_from_sync_code() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let pool = WorkerPool::new(2).unwrap();

        let handle = pool.submit(square, 5).unwrap();
        assert_eq!(handle.wait().unwrap(), 25);

        let results: Vec<u64> = pool
            .map(square, vec![1, 2, 3])
            .unwrap()
            .into_blocking_iter()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(results, vec![1, 4, 9]);

        runtime.block_on(pool.shutdown());
    }
}
