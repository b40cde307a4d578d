//! Domain-level REST client.
//!
//! # Data Flow
//! ```text
//! RestClient (owns one Dispatcher)
//!     → text.rs: TextClient::anagrams(inputs)
//!         one POST descriptor per input
//!         → partition evenly across workers
//!         → Dispatcher::dispatch_batch
//!         → decode each body as JSON, flatten in input order
//! ```

pub mod text;

use crate::dispatch::{DispatchResult, Dispatcher};
use crate::net::{HttpTransport, Transport};

pub use text::TextClient;

/// Entry point for the REST API, one accessor per resource family.
#[derive(Debug)]
pub struct RestClient<T: Transport = HttpTransport> {
    dispatcher: Dispatcher<T>,
}

impl RestClient<HttpTransport> {
    pub fn new(workers: usize, hostname: impl Into<String>, port: u16) -> DispatchResult<Self> {
        Ok(Self {
            dispatcher: Dispatcher::new(workers, hostname, port)?,
        })
    }
}

impl<T: Transport> RestClient<T> {
    pub fn from_dispatcher(dispatcher: Dispatcher<T>) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Dispatcher<T> {
        &self.dispatcher
    }

    /// `/text` endpoints.
    pub fn text(&self) -> TextClient<'_, T> {
        TextClient::new(&self.dispatcher)
    }

    pub async fn shutdown(&self) {
        self.dispatcher.shutdown().await;
    }
}
