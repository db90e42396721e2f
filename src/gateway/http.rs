use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::debug;

use super::{xmlrpc, RemoteCall};
use crate::errors::GatewayError;

/// Posts the XML-RPC request straight to the target endpoint.
#[derive(Clone)]
pub struct DirectClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl DirectClient {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, GatewayError> {
        Ok(Self {
            client: build_client(user_agent, timeout)?,
            timeout,
        })
    }
}

#[async_trait]
impl RemoteCall for DirectClient {
    async fn call(&self, endpoint: &str, method: &str) -> Result<String, GatewayError> {
        debug!(endpoint, method, "Sending XML-RPC request");

        let response = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, "text/xml")
            .body(xmlrpc::method_call(method))
            .send()
            .await
            .map_err(|e| GatewayError::from_reqwest(endpoint, self.timeout, e))?;

        read_body(endpoint, endpoint, self.timeout, response).await
    }
}

/// Hands the request to a relay, which forwards it to the endpoint and
/// returns the remote response text.
#[derive(Clone)]
pub struct RelayClient {
    client: reqwest::Client,
    relay_url: String,
    timeout: Duration,
}

impl RelayClient {
    pub fn new(relay_url: &str, user_agent: &str, timeout: Duration) -> Result<Self, GatewayError> {
        Ok(Self {
            client: build_client(user_agent, timeout)?,
            relay_url: relay_url.to_string(),
            timeout,
        })
    }
}

#[async_trait]
impl RemoteCall for RelayClient {
    async fn call(&self, endpoint: &str, method: &str) -> Result<String, GatewayError> {
        debug!(relay = %self.relay_url, endpoint, method, "Sending XML-RPC request through relay");

        let envelope = xmlrpc::method_call(method);
        let response = self
            .client
            .post(&self.relay_url)
            .form(&[("rpcserver", endpoint), ("rpctext", envelope.as_str())])
            .send()
            .await
            .map_err(|e| GatewayError::from_reqwest(&self.relay_url, self.timeout, e))?;

        read_body(&self.relay_url, endpoint, self.timeout, response).await
    }
}

fn build_client(user_agent: &str, timeout: Duration) -> Result<reqwest::Client, GatewayError> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
        .map_err(|e| GatewayError::Request {
            endpoint: String::new(),
            message: e.to_string(),
        })
}

/// HTTP-level failures are blamed on `hop`, the host actually contacted.
/// Empty and fault replies come from `endpoint`, the info server.
async fn read_body(
    hop: &str,
    endpoint: &str,
    timeout: Duration,
    response: reqwest::Response,
) -> Result<String, GatewayError> {
    let status = response.status();
    if !status.is_success() {
        return Err(GatewayError::Status {
            endpoint: hop.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| GatewayError::from_reqwest(hop, timeout, e))?;

    if body.trim().is_empty() {
        return Err(GatewayError::Empty {
            endpoint: endpoint.to_string(),
        });
    }
    if xmlrpc::is_fault(&body) {
        return Err(GatewayError::Fault {
            endpoint: endpoint.to_string(),
        });
    }

    Ok(body)
}
