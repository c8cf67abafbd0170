//! Gateway trait and request/response types.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use crate::error::Result;

/// A single HTTP call against a gateway instance.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayRequest {
    pub method: Method,
    /// Path relative to the instance base URL, starting with '/'.
    pub path: String,
    pub body: Option<Value>,
}

impl GatewayRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body: Some(body),
        }
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::PUT,
            path: path.into(),
            body: Some(body),
        }
    }
}

/// Raw gateway response. Non-2xx statuses are data, not errors.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    pub status: u16,
    pub body: String,
}

impl GatewayResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body parsed as JSON, `Value::Null` when it is not JSON.
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }

    /// First `max` characters of the body.
    pub fn snippet(&self, max: usize) -> String {
        let body = self.body.trim();
        match body.char_indices().nth(max) {
            Some((idx, _)) => format!("{}...", &body[..idx]),
            None => body.to_string(),
        }
    }
}

/// Transport to a WhatsApp gateway instance.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Perform one request. Transport failures are errors; HTTP error
    /// statuses are returned as responses.
    async fn send(&self, request: &GatewayRequest) -> Result<GatewayResponse>;
}
