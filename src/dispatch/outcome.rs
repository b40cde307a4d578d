//! Per-request results.

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::dispatch::types::{DispatchError, DispatchResult};

/// What one executed descriptor produced: the body text, the time from
/// sending the request to having read the whole body, and the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOutcome {
    pub body: String,
    pub elapsed: Duration,
    pub endpoint: String,
    /// HTTP status code of the response.
    pub status: u16,
}

impl RequestOutcome {
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> DispatchResult<T> {
        serde_json::from_str(&self.body).map_err(|source| DispatchError::Decode {
            endpoint: self.endpoint.clone(),
            source,
        })
    }

    /// `(body, elapsed seconds, endpoint)`.
    pub fn into_tuple(self) -> (String, f64, String) {
        let secs = self.elapsed_secs();
        (self.body, secs, self.endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn outcome(body: &str, status: u16) -> RequestOutcome {
        RequestOutcome {
            body: body.to_string(),
            elapsed: Duration::from_millis(1500),
            endpoint: "/".to_string(),
            status,
        }
    }

    #[test]
    fn test_json_decoding() {
        let o = outcome(r#"{"status":"okay"}"#, 200);
        let v: Value = o.json().unwrap();
        assert_eq!(v, json!({"status": "okay"}));

        let err = outcome("not json", 200).json::<Value>().unwrap_err();
        assert!(matches!(err, DispatchError::Decode { ref endpoint, .. } if endpoint == "/"));
    }

    #[test]
    fn test_tuple_and_status() {
        let o = outcome("x", 503);
        assert!(!o.is_success());
        assert!(outcome("x", 204).is_success());

        let (body, secs, endpoint) = o.into_tuple();
        assert_eq!(body, "x");
        assert!((secs - 1.5).abs() < f64::EPSILON);
        assert_eq!(endpoint, "/");
    }
}
