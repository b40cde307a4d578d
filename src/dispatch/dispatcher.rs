//! The request dispatcher.
//!
//! # Responsibilities
//! - Validate the target once, at construction
//! - Turn descriptors into HTTP requests before any worker is engaged
//! - Run each partition on one worker over one connection, timing every
//!   request/response exchange
//! - Hand results back per partition, in submission order

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use axum::body::{Body, Bytes};
use axum::http::header::{ACCEPT, CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, HOST, USER_AGENT};
use axum::http::{HeaderMap, HeaderValue, Request, Uri};

use crate::config::DispatcherConfig;
use crate::dispatch::descriptor::{Method, RequestDescriptor};
use crate::dispatch::handle::{PartitionResults, PendingResults};
use crate::dispatch::outcome::RequestOutcome;
use crate::dispatch::partition::partition_evenly;
use crate::dispatch::types::{DispatchError, DispatchResult};
use crate::net::{Connection, HttpTransport, Transport, TransportError};
use crate::observability::metrics;
use crate::pool::{PoolError, WorkerPool};

/// Value of the `User-Agent` header on every request.
pub const CLIENT_ID: &str = concat!("request-dispatcher/", env!("CARGO_PKG_VERSION"));

/// Host and port every request is sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    hostname: String,
    port: u16,
}

impl Target {
    pub fn new(hostname: impl Into<String>, port: u16) -> DispatchResult<Self> {
        let hostname = hostname.into();
        if hostname.trim().is_empty() {
            return Err(DispatchError::InvalidTarget(
                "hostname must not be blank".to_string(),
            ));
        }
        if port == 0 {
            return Err(DispatchError::InvalidTarget(
                "port must be at least 1".to_string(),
            ));
        }
        Ok(Self { hostname, port })
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `hostname:port`, as sent in the `Host` header.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }

    /// Headers sent with every request.
    fn base_headers(&self) -> DispatchResult<HeaderMap> {
        let host = HeaderValue::from_str(&self.authority()).map_err(|_| {
            DispatchError::InvalidTarget(format!(
                "hostname {:?} is not valid in a Host header",
                self.hostname
            ))
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(HOST, host);
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_ID));
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        Ok(headers)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.hostname, self.port)
    }
}

/// State shared by every job the dispatcher submits.
struct Shared<T> {
    target: Target,
    headers: HeaderMap,
    transport: T,
}

/// Sends batches of requests to one backend from a fixed pool of workers.
pub struct Dispatcher<T: Transport = HttpTransport> {
    pool: WorkerPool,
    shared: Arc<Shared<T>>,
}

impl Dispatcher<HttpTransport> {
    /// Dispatcher speaking plain HTTP/1.1 to `hostname:port`.
    pub fn new(workers: usize, hostname: impl Into<String>, port: u16) -> DispatchResult<Self> {
        Self::with_transport(workers, hostname, port, HttpTransport::new())
    }

    pub fn from_config(config: &DispatcherConfig) -> DispatchResult<Self> {
        Self::new(
            config.pool.workers,
            config.target.hostname.clone(),
            config.target.port,
        )
    }
}

impl<T: Transport> Dispatcher<T> {
    /// Dispatcher using a caller-supplied transport.
    ///
    /// All parameters are checked before the worker pool is started.
    pub fn with_transport(
        workers: usize,
        hostname: impl Into<String>,
        port: u16,
        transport: T,
    ) -> DispatchResult<Self> {
        let target = Target::new(hostname, port)?;
        if workers == 0 {
            return Err(PoolError::InvalidWorkerCount(workers).into());
        }
        let headers = target.base_headers()?;

        let pool = WorkerPool::new(workers)?;

        tracing::info!(backend = %target, workers, "Dispatcher ready");

        Ok(Self {
            pool,
            shared: Arc::new(Shared {
                target,
                headers,
                transport,
            }),
        })
    }

    pub fn target(&self) -> &Target {
        &self.shared.target
    }

    pub fn workers(&self) -> usize {
        self.pool.workers()
    }

    pub fn transport(&self) -> &T {
        &self.shared.transport
    }

    pub fn is_shut_down(&self) -> bool {
        self.pool.is_shut_down()
    }

    /// Run `descriptors` in order over one connection on the calling task.
    ///
    /// Every descriptor is turned into a request before the connection is
    /// opened. The connection is closed once, after the last exchange or the
    /// first failure; an empty list opens and immediately closes it.
    pub async fn execute(
        &self,
        descriptors: &[RequestDescriptor],
    ) -> DispatchResult<Vec<RequestOutcome>> {
        if self.pool.is_shut_down() {
            return Err(PoolError::ShutDown.into());
        }
        let requests = prepare_all(descriptors)?;
        run_partition(&self.shared, requests).await
    }

    /// Run each partition on its own worker and connection.
    ///
    /// Results are yielded in partition order, not completion order.
    pub fn dispatch_batch<I>(&self, partitions: I) -> DispatchResult<PartitionResults>
    where
        I: IntoIterator<Item = Vec<RequestDescriptor>>,
    {
        let prepared = partitions
            .into_iter()
            .map(|partition| prepare_all(&partition))
            .collect::<DispatchResult<Vec<_>>>()?;

        tracing::debug!(partitions = prepared.len(), "Dispatching batch");

        let shared = self.shared.clone();
        let batch = self.pool.map(
            move |requests: Vec<PreparedRequest>| {
                let shared = shared.clone();
                async move { run_partition(&shared, requests).await }
            },
            prepared,
        )?;

        Ok(PartitionResults::new(batch))
    }

    /// Run one partition on a worker and return its pending result.
    pub fn dispatch_single(&self, descriptors: Vec<RequestDescriptor>) -> DispatchResult<PendingResults> {
        let requests = prepare_all(&descriptors)?;
        let shared = self.shared.clone();
        let handle = self.pool.submit(
            |(shared, requests): (Arc<Shared<T>>, Vec<PreparedRequest>)| async move {
                run_partition(&shared, requests).await
            },
            (shared, requests),
        )?;
        Ok(PendingResults::new(handle))
    }

    /// Split `descriptors` into one contiguous partition per worker.
    pub fn partition_for_workers(
        &self,
        descriptors: &[RequestDescriptor],
    ) -> DispatchResult<Vec<Vec<RequestDescriptor>>> {
        partition_evenly(descriptors, self.workers())
    }

    /// Wait for in-flight partitions, then stop the workers. Every later
    /// `execute` or dispatch fails with a scheduling error.
    pub async fn shutdown(&self) {
        self.pool.shutdown().await;
        tracing::info!(backend = %self.shared.target, "Dispatcher shut down");
    }
}

impl<T: Transport> fmt::Debug for Dispatcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("target", &self.shared.target)
            .field("pool", &self.pool)
            .finish()
    }
}

/// A descriptor checked and encoded, ready to become an HTTP request.
#[derive(Debug, Clone)]
struct PreparedRequest {
    endpoint: String,
    method: Method,
    uri: Uri,
    body: Option<Bytes>,
}

impl PreparedRequest {
    fn into_request(self, headers: &HeaderMap) -> Request<Body> {
        let body = match &self.body {
            Some(bytes) => Body::from(bytes.clone()),
            None => Body::empty(),
        };

        let mut request = Request::new(body);
        *request.method_mut() = self.method.as_http();
        *request.uri_mut() = self.uri;
        *request.headers_mut() = headers.clone();

        if let Some(bytes) = &self.body {
            let request_headers = request.headers_mut();
            request_headers.insert(CONTENT_LENGTH, HeaderValue::from(bytes.len()));
            request_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        request
    }
}

fn prepare(descriptor: &RequestDescriptor) -> DispatchResult<PreparedRequest> {
    let endpoint = descriptor.endpoint();
    let uri: Uri = endpoint.parse().map_err(|e| {
        DispatchError::InvalidInput(format!("{endpoint:?} is not a valid request target: {e}"))
    })?;

    let body = descriptor
        .payload()
        .map(serde_json::to_vec)
        .transpose()
        .map_err(|e| DispatchError::InvalidInput(format!("payload for {endpoint} did not encode: {e}")))?
        .map(Bytes::from);

    Ok(PreparedRequest {
        endpoint: endpoint.to_string(),
        method: descriptor.method(),
        uri,
        body,
    })
}

fn prepare_all(descriptors: &[RequestDescriptor]) -> DispatchResult<Vec<PreparedRequest>> {
    descriptors.iter().map(prepare).collect()
}

async fn run_partition<T: Transport>(
    shared: &Shared<T>,
    requests: Vec<PreparedRequest>,
) -> DispatchResult<Vec<RequestOutcome>> {
    let target = &shared.target;

    let mut connection = shared
        .transport
        .connect(target.hostname(), target.port())
        .await
        .map_err(|e| {
            tracing::warn!(backend = %target, error = %e, "Failed to open connection");
            metrics::record_transport_error();
            e
        })?;

    let exchanged = exchange_all(&mut connection, &shared.headers, requests).await;
    connection.close().await;
    exchanged
}

async fn exchange_all<C: Connection>(
    connection: &mut C,
    headers: &HeaderMap,
    requests: Vec<PreparedRequest>,
) -> DispatchResult<Vec<RequestOutcome>> {
    let mut outcomes = Vec::with_capacity(requests.len());

    for request in requests {
        let endpoint = request.endpoint.clone();
        let method = request.method;

        let start = Instant::now();
        let response = connection
            .send(request.into_request(headers))
            .await
            .map_err(|e| {
                tracing::warn!(endpoint = %endpoint, method = %method, error = %e, "Request failed");
                metrics::record_transport_error();
                e
            })?;
        let body = String::from_utf8(response.body.to_vec()).map_err(TransportError::from)?;
        let elapsed = start.elapsed();

        let status = response.status.as_u16();
        metrics::record_request(&endpoint, method.as_str(), status, elapsed);
        tracing::trace!(
            endpoint = %endpoint,
            method = %method,
            status,
            elapsed_ms = elapsed.as_millis() as u64,
            "Request completed"
        );

        outcomes.push(RequestOutcome {
            body,
            elapsed,
            endpoint,
            status,
        });
    }

    Ok(outcomes)
}
