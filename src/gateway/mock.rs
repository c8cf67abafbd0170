//! Scripted in-memory gateway for tests.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use super::client::{Gateway, GatewayRequest, GatewayResponse};
use crate::error::{Error, Result};

/// Answers requests from a per-route script and records every request.
///
/// Unscripted routes answer 404. A route scripted more than once replays its
/// responses in order and then repeats the last one.
#[derive(Default)]
pub struct MockGateway {
    routes: Mutex<HashMap<(String, String), VecDeque<Option<GatewayResponse>>>>,
    requests: Mutex<Vec<GatewayRequest>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.push(method, path, Some(GatewayResponse::new(status, body)))
    }

    /// Script a transport failure.
    pub fn fail(self, method: &str, path: &str) -> Self {
        self.push(method, path, None)
    }

    fn push(self, method: &str, path: &str, response: Option<GatewayResponse>) -> Self {
        self.routes
            .lock()
            .unwrap()
            .entry((method.to_uppercase(), path.to_string()))
            .or_default()
            .push_back(response);
        self
    }

    pub fn requests(&self) -> Vec<GatewayRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .count()
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn send(&self, request: &GatewayRequest) -> Result<GatewayResponse> {
        self.requests.lock().unwrap().push(request.clone());

        let key = (request.method.as_str().to_string(), request.path.clone());
        let mut routes = self.routes.lock().unwrap();
        let scripted = routes.get_mut(&key).and_then(|queue| {
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        });

        match scripted {
            Some(Some(response)) => Ok(response),
            Some(None) => Err(Error::Gateway(format!(
                "connection refused: {}",
                request.path
            ))),
            None => Ok(GatewayResponse::new(404, "")),
        }
    }
}
