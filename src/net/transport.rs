//! Transport abstraction.

use std::future::Future;

use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use thiserror::Error;

/// Errors raised while talking to the backend.
#[derive(Debug, Error)]
pub enum TransportError {
    /// TCP connection could not be established.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// HTTP/1.1 handshake failed.
    #[error("HTTP handshake failed: {0}")]
    Handshake(#[source] hyper::Error),

    /// Sending the request or receiving the response head failed.
    #[error("request failed: {0}")]
    Request(#[source] hyper::Error),

    /// Reading the response body failed.
    #[error("failed to read response body: {0}")]
    Body(#[source] axum::Error),

    /// The response body was not valid UTF-8.
    #[error("response body is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// Catch-all for transports that do not fit the variants above.
    #[error("transport error: {0}")]
    Other(String),
}

/// A fully read response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

/// Opens connections to a backend.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;

    /// Open one connection to `hostname:port`.
    fn connect(
        &self,
        hostname: &str,
        port: u16,
    ) -> impl Future<Output = Result<Self::Connection, TransportError>> + Send;
}

/// One open connection, used for a sequence of request/response exchanges.
pub trait Connection: Send + Sized + 'static {
    /// Send one request and read the complete response.
    fn send(
        &mut self,
        request: Request<Body>,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send;

    /// Close the connection.
    fn close(self) -> impl Future<Output = ()> + Send;
}
