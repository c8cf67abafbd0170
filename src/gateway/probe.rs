//! Ordered endpoint probing.
//!
//! Gateway deployments in the wild expose different paths, methods and
//! payload shapes for the same operation, with no way to ask which version
//! is running. A [`Probe`] holds the known variants in preference order and
//! tries them one by one until a deployment accepts one.

use thiserror::Error;

use super::client::{Gateway, GatewayRequest, GatewayResponse};

/// Predicate deciding whether a response means "this variant does not exist here".
pub type NotSupported = fn(&GatewayResponse) -> bool;

/// Default not-supported predicate: 404 and 405.
pub fn missing_route(response: &GatewayResponse) -> bool {
    matches!(response.status, 404 | 405)
}

/// All candidates were rejected.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{last_error}")]
pub struct ProbeFailure {
    pub attempts: usize,
    pub last_error: String,
}

/// The candidate that succeeded.
#[derive(Debug, Clone)]
pub struct ProbeSuccess {
    pub index: usize,
    pub request: GatewayRequest,
    pub response: GatewayResponse,
}

#[derive(Debug, Clone)]
pub struct Probe {
    operation: &'static str,
    candidates: Vec<GatewayRequest>,
    not_supported: NotSupported,
}

impl Probe {
    pub fn new(operation: &'static str, candidates: Vec<GatewayRequest>) -> Self {
        Self {
            operation,
            candidates,
            not_supported: missing_route,
        }
    }

    pub fn with_not_supported(mut self, predicate: NotSupported) -> Self {
        self.not_supported = predicate;
        self
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn candidates(&self) -> &[GatewayRequest] {
        &self.candidates
    }

    /// Try candidates in order and stop at the first 2xx.
    ///
    /// Not-supported responses and genuine failures both move on to the next
    /// candidate. A genuine failure (other status or transport error) is kept
    /// as the reported error over any later not-supported response.
    pub async fn run(&self, gateway: &dyn Gateway) -> Result<ProbeSuccess, ProbeFailure> {
        let mut last_error: Option<String> = None;
        let mut genuine = false;

        for (index, candidate) in self.candidates.iter().enumerate() {
            match gateway.send(candidate).await {
                Ok(response) if response.is_success() => {
                    tracing::debug!(
                        "{}: {} {} accepted (candidate {})",
                        self.operation,
                        candidate.method,
                        candidate.path,
                        index
                    );
                    return Ok(ProbeSuccess {
                        index,
                        request: candidate.clone(),
                        response,
                    });
                }
                Ok(response) if (self.not_supported)(&response) => {
                    tracing::debug!(
                        "{}: {} {} not supported ({})",
                        self.operation,
                        candidate.method,
                        candidate.path,
                        response.status
                    );
                    if !genuine {
                        last_error = Some(describe(&response));
                    }
                }
                Ok(response) => {
                    tracing::warn!(
                        "{}: {} {} failed with {}",
                        self.operation,
                        candidate.method,
                        candidate.path,
                        response.status
                    );
                    last_error = Some(describe(&response));
                    genuine = true;
                }
                Err(e) => {
                    tracing::warn!(
                        "{}: {} {} transport error: {}",
                        self.operation,
                        candidate.method,
                        candidate.path,
                        e
                    );
                    last_error = Some(e.to_string());
                    genuine = true;
                }
            }
        }

        Err(ProbeFailure {
            attempts: self.candidates.len(),
            last_error: last_error.unwrap_or_else(|| "no endpoint candidates".to_string()),
        })
    }
}

fn describe(response: &GatewayResponse) -> String {
    let snippet = response.snippet(200);
    if snippet.is_empty() {
        format!("HTTP {}", response.status)
    } else {
        format!("HTTP {}: {}", response.status, snippet)
    }
}
