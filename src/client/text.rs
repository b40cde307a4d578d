//! Client for the `/text` endpoints.

use serde_json::Value;

use crate::dispatch::{DispatchResult, Dispatcher, Payload, RequestDescriptor};
use crate::net::Transport;

/// Endpoint grouping words of each input that are anagrams of one another.
pub const ANAGRAMS_ENDPOINT: &str = "/text/anagrams";

/// Anagram groups found in one input.
pub type AnagramGroups = Vec<Vec<String>>;

#[derive(Debug)]
pub struct TextClient<'a, T: Transport> {
    dispatcher: &'a Dispatcher<T>,
}

impl<'a, T: Transport> TextClient<'a, T> {
    pub fn new(dispatcher: &'a Dispatcher<T>) -> Self {
        Self { dispatcher }
    }

    /// Find the anagram groups in each input, one request per input.
    ///
    /// Requests are spread evenly over the workers; results come back in
    /// input order.
    pub async fn anagrams<S: AsRef<str>>(&self, inputs: &[S]) -> DispatchResult<Vec<AnagramGroups>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let descriptors = inputs
            .iter()
            .map(|input| {
                let mut payload = Payload::new();
                payload.insert("input".to_string(), Value::String(input.as_ref().to_string()));
                RequestDescriptor::post(ANAGRAMS_ENDPOINT, payload)
            })
            .collect::<DispatchResult<Vec<_>>>()?;

        let partitions = self.dispatcher.partition_for_workers(&descriptors)?;
        let results = self.dispatcher.dispatch_batch(partitions)?.collect_all().await?;

        results
            .into_iter()
            .flatten()
            .map(|outcome| outcome.json::<AnagramGroups>())
            .collect()
    }
}
