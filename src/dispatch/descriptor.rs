//! Request descriptors.
//!
//! A descriptor is valid from the moment it exists: construction (including
//! deserialization) runs every check, so the rest of the crate never sees a
//! half-formed request.

use std::fmt;
use std::str::FromStr;

use axum::http::uri::PathAndQuery;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::dispatch::types::{DispatchError, DispatchResult};

/// JSON object sent as a POST body.
pub type Payload = Map<String, Value>;

/// Supported HTTP methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }

    pub(crate) fn as_http(&self) -> axum::http::Method {
        match self {
            Method::Get => axum::http::Method::GET,
            Method::Post => axum::http::Method::POST,
        }
    }
}

impl FromStr for Method {
    type Err = DispatchError;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            _ => Err(DispatchError::InvalidDescriptor(format!(
                "unsupported method {s:?} (expected GET or POST)"
            ))),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One HTTP call: endpoint, method and, for POST, a JSON payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DescriptorFields", into = "DescriptorFields")]
pub struct RequestDescriptor {
    endpoint: String,
    method: Method,
    payload: Option<Payload>,
}

impl RequestDescriptor {
    /// Build a descriptor, parsing `method` case-insensitively.
    ///
    /// Fails unless `endpoint` is a non-empty absolute path, `method` is GET
    /// or POST, and a payload is present exactly when the method is POST.
    pub fn new(
        endpoint: impl Into<String>,
        method: &str,
        payload: Option<Payload>,
    ) -> DispatchResult<Self> {
        Self::with_method(endpoint, method.parse()?, payload)
    }

    pub fn with_method(
        endpoint: impl Into<String>,
        method: Method,
        payload: Option<Payload>,
    ) -> DispatchResult<Self> {
        let endpoint = endpoint.into();
        validate_endpoint(&endpoint)?;

        match (method, &payload) {
            (Method::Get, Some(_)) => {
                return Err(DispatchError::InvalidDescriptor(format!(
                    "GET {endpoint} must not carry a payload"
                )));
            }
            (Method::Post, None) => {
                return Err(DispatchError::InvalidDescriptor(format!(
                    "POST {endpoint} requires a payload"
                )));
            }
            _ => {}
        }

        Ok(Self {
            endpoint,
            method,
            payload,
        })
    }

    /// GET request without a body.
    pub fn get(endpoint: impl Into<String>) -> DispatchResult<Self> {
        Self::with_method(endpoint, Method::Get, None)
    }

    /// POST request with a JSON body.
    pub fn post(endpoint: impl Into<String>, payload: Payload) -> DispatchResult<Self> {
        Self::with_method(endpoint, Method::Post, Some(payload))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }
}

impl fmt::Display for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.endpoint)?;
        if let Some(payload) = &self.payload {
            write!(f, " {}", Value::Object(payload.clone()))?;
        }
        Ok(())
    }
}

fn validate_endpoint(endpoint: &str) -> DispatchResult<()> {
    if endpoint.is_empty() {
        return Err(DispatchError::InvalidDescriptor(
            "endpoint must not be empty".to_string(),
        ));
    }
    if !endpoint.starts_with('/') {
        return Err(DispatchError::InvalidDescriptor(format!(
            "endpoint {endpoint:?} must start with '/'"
        )));
    }
    PathAndQuery::from_str(endpoint).map_err(|e| {
        DispatchError::InvalidDescriptor(format!("endpoint {endpoint:?} is not a valid path: {e}"))
    })?;
    Ok(())
}

/// Wire form of a descriptor; `data` is accepted as an alias for `payload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DescriptorFields {
    endpoint: String,
    method: String,
    #[serde(default, alias = "data", skip_serializing_if = "Option::is_none")]
    payload: Option<Payload>,
}

impl TryFrom<DescriptorFields> for RequestDescriptor {
    type Error = DispatchError;

    fn try_from(fields: DescriptorFields) -> Result<Self, Self::Error> {
        RequestDescriptor::new(fields.endpoint, &fields.method, fields.payload)
    }
}

impl From<RequestDescriptor> for DescriptorFields {
    fn from(descriptor: RequestDescriptor) -> Self {
        Self {
            endpoint: descriptor.endpoint,
            method: descriptor.method.as_str().to_string(),
            payload: descriptor.payload,
        }
    }
}
