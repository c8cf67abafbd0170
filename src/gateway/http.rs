//! reqwest-backed gateway client.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::client::{Gateway, GatewayRequest, GatewayResponse};
use crate::error::Result;

/// UAZAPI instance reachable at `base_url`, authenticated by a `token` header.
pub struct HttpGateway {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url, token))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            token: token.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn send(&self, request: &GatewayRequest) -> Result<GatewayResponse> {
        let url = self.url(&request.path);

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .header("token", &self.token)
            .header("Accept", "application/json");
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;

        tracing::debug!("{} {} -> {}", request.method, request.path, status);

        Ok(GatewayResponse { status, body })
    }
}
