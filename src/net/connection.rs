//! HTTP/1.1 connections to the backend.
//!
//! # Responsibilities
//! - Open a TCP connection and run the hyper client handshake
//! - Drive the connection on a background task of the current runtime
//! - Exchange requests/responses sequentially over the one connection
//! - Reopen the socket when the server closed it between requests
//! - Generate unique connection IDs for tracing

use std::sync::atomic::{AtomicU64, Ordering};

use axum::body::Body;
use axum::http::Request;
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

use crate::net::transport::{Connection, RawResponse, Transport, TransportError};

/// Global atomic counter for connection IDs.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for an outbound connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Plain-TCP HTTP/1.1 transport.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpTransport;

impl HttpTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for HttpTransport {
    type Connection = HttpConnection;

    async fn connect(&self, hostname: &str, port: u16) -> Result<HttpConnection, TransportError> {
        let addr = format!("{hostname}:{port}");
        let id = ConnectionId::new();
        let (sender, driver) = open(id, &addr).await?;

        tracing::debug!(connection_id = %id, address = %addr, "Connection opened");

        Ok(HttpConnection {
            id,
            addr,
            sender,
            driver,
        })
    }
}

/// Connect, handshake and spawn the task driving the connection.
async fn open(
    id: ConnectionId,
    addr: &str,
) -> Result<(http1::SendRequest<Body>, JoinHandle<()>), TransportError> {
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|source| TransportError::Connect {
            addr: addr.to_string(),
            source,
        })?;
    if let Err(e) = stream.set_nodelay(true) {
        tracing::debug!(address = %addr, error = %e, "Failed to set TCP_NODELAY");
    }

    let (sender, conn) = http1::handshake(TokioIo::new(stream))
        .await
        .map_err(TransportError::Handshake)?;

    let driver = tokio::spawn(async move {
        if let Err(e) = conn.await {
            tracing::debug!(connection_id = %id, error = %e, "Connection ended with error");
        }
    });

    Ok((sender, driver))
}

/// An open keep-alive connection.
///
/// If the server has closed the socket (`Connection: close`, idle timeout)
/// by the time the next request is due, the socket is reopened to the same
/// address under the same ID before anything is written.
#[derive(Debug)]
pub struct HttpConnection {
    id: ConnectionId,
    addr: String,
    sender: http1::SendRequest<Body>,
    driver: JoinHandle<()>,
}

impl HttpConnection {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    async fn reopen(&mut self) -> Result<(), TransportError> {
        let (sender, driver) = open(self.id, &self.addr).await?;
        self.sender = sender;
        let stale = std::mem::replace(&mut self.driver, driver);
        if let Err(e) = stale.await {
            tracing::warn!(connection_id = %self.id, error = %e, "Connection task failed");
        }

        tracing::debug!(connection_id = %self.id, address = %self.addr, "Connection reopened");
        Ok(())
    }
}

impl Connection for HttpConnection {
    async fn send(&mut self, request: Request<Body>) -> Result<RawResponse, TransportError> {
        // Nothing has been written yet, so a closed socket is safe to replace.
        if self.sender.is_closed() || self.sender.ready().await.is_err() {
            self.reopen().await?;
            self.sender.ready().await.map_err(TransportError::Request)?;
        }

        let response = self
            .sender
            .send_request(request)
            .await
            .map_err(TransportError::Request)?;

        let (parts, body) = response.into_parts();
        let body = axum::body::to_bytes(Body::new(body), usize::MAX)
            .await
            .map_err(TransportError::Body)?;

        Ok(RawResponse {
            status: parts.status,
            body,
        })
    }

    async fn close(self) {
        let Self {
            id, sender, driver, ..
        } = self;

        // With the last sender gone hyper shuts the connection down.
        drop(sender);
        if let Err(e) = driver.await {
            tracing::warn!(connection_id = %id, error = %e, "Connection task failed");
        }

        tracing::debug!(connection_id = %id, "Connection closed");
    }
}
