//! Store-and-forward relay for XML-RPC requests.
//!
//! A client that cannot reach the info server itself posts the target URL and
//! the request document here; the relay forwards the document verbatim and
//! hands back the remote response starting at its XML declaration.

use axum::{
    extract::{Form, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::IntoResponse,
    routing::post,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{info, warn};
use uuid::Uuid;

use super::error::RelayError;
use crate::config::RelaySettings;

/// Marker at which the forwarded response is cut.
pub const DOCUMENT_START: &str = "<?";

#[derive(Clone)]
pub struct RelayState {
    pub client: reqwest::Client,
    pub upstream_timeout: Duration,
}

impl RelayState {
    pub fn new(settings: &RelaySettings) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent("cloud-pool-monitor relay")
            .build()?;
        Ok(Self {
            client,
            upstream_timeout: settings.upstream_timeout(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RelayRequest {
    pub rpcserver: Option<String>,
    pub rpctext: Option<String>,
}

pub fn create_router(state: RelayState, settings: &RelaySettings) -> Router {
    Router::new()
        .route(&settings.path, post(relay_handler))
        .fallback(fallback_handler)
        .with_state(Arc::new(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(settings.max_body_bytes)),
        )
}

async fn relay_handler(
    State(state): State<Arc<RelayState>>,
    Form(request): Form<RelayRequest>,
) -> Result<impl IntoResponse, RelayError> {
    let target = request
        .rpcserver
        .filter(|s| !s.trim().is_empty())
        .ok_or(RelayError::MissingServer)?;
    let text = request
        .rpctext
        .filter(|s| !s.trim().is_empty())
        .ok_or(RelayError::MissingText)?;
    let text: String = text.chars().filter(|c| *c != '\n' && *c != '\r').collect();

    let request_id = Uuid::new_v4();
    info!(%request_id, target = %target, bytes = text.len(), "Relaying request");

    let response = state
        .client
        .post(&target)
        .header(CONTENT_TYPE, "text/xml")
        .body(text)
        .timeout(state.upstream_timeout)
        .send()
        .await
        .map_err(|e| RelayError::from_upstream(&target, e))?;

    let status = response.status();
    if !status.is_success() {
        warn!(%request_id, status = status.as_u16(), "Upstream answered with an error status");
    }

    let body = response
        .text()
        .await
        .map_err(|e| RelayError::from_upstream(&target, e))?;

    Ok((
        [(CONTENT_TYPE, "text/xml")],
        trim_to_document(&body).to_string(),
    ))
}

async fn fallback_handler() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Everything from the first `<?` onward, or the whole body if there is none.
pub fn trim_to_document(body: &str) -> &str {
    match body.find(DOCUMENT_START) {
        Some(start) => &body[start..],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_leading_noise() {
        assert_eq!(
            trim_to_document("HTTP/1.0 200 OK\r\n\r\n<?xml version='1.0'?><a/>"),
            "<?xml version='1.0'?><a/>"
        );
    }

    #[test]
    fn body_without_marker_is_untouched() {
        assert_eq!(trim_to_document("plain text"), "plain text");
        assert_eq!(trim_to_document(""), "");
    }

    #[test]
    fn only_first_marker_counts() {
        assert_eq!(trim_to_document("x<?a?><?b?>"), "<?a?><?b?>");
    }
}
