//! Remote-call collaborator used by the poll loop.

pub mod http;
pub mod xmlrpc;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::Settings;
use crate::errors::GatewayError;

pub use http::{DirectClient, RelayClient};

/// Issues one XML-RPC call and returns the raw response text.
#[async_trait]
pub trait RemoteCall: Send + Sync {
    async fn call(&self, endpoint: &str, method: &str) -> Result<String, GatewayError>;
}

/// Picks the relay when one is configured, otherwise talks to the endpoint directly.
pub fn from_settings(settings: &Settings) -> Result<Arc<dyn RemoteCall>, GatewayError> {
    let timeout = settings.monitor.request_timeout();
    let user_agent = &settings.gateway.user_agent;

    match settings.gateway.relay_url.as_deref() {
        Some(relay_url) if !relay_url.is_empty() => {
            Ok(Arc::new(RelayClient::new(relay_url, user_agent, timeout)?))
        }
        _ => Ok(Arc::new(DirectClient::new(user_agent, timeout)?)),
    }
}
