//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher worker job
//!     → transport.rs (Transport::connect: one connection per partition)
//!     → connection.rs (HTTP/1.1 over TCP via hyper, keep-alive)
//!     → Connection::send for each request, in order
//!     → Connection::close exactly once
//! ```
//!
//! # Design Decisions
//! - Transport is a trait so the dispatcher can run against a mock
//! - One connection never serves two partitions
//! - A socket the server closed between requests is reopened before the
//!   next request is written; nothing already sent is ever retried
//! - No timeouts at this layer; errors propagate unchanged

pub mod connection;
pub mod transport;

pub use connection::{ConnectionId, HttpConnection, HttpTransport};
pub use transport::{Connection, RawResponse, Transport, TransportError};
