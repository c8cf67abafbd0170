//! WhatsApp gateway (UAZAPI) access.

pub mod client;
pub mod decode;
pub mod endpoints;
pub mod http;
pub mod probe;

#[cfg(test)]
pub mod mock;

pub use client::{Gateway, GatewayRequest, GatewayResponse};
pub use http::HttpGateway;
pub use probe::{Probe, ProbeFailure, ProbeSuccess};

use std::sync::Arc;

use crate::config::GatewaySettings;
use crate::error::Result;
use crate::store::Instance;

/// Build the gateway client for a tenant instance.
pub fn for_instance(instance: &Instance, settings: &GatewaySettings) -> Result<Arc<dyn Gateway>> {
    let gateway = HttpGateway::new(&instance.base_url, &instance.token, settings.timeout())?;
    Ok(Arc::new(gateway))
}
