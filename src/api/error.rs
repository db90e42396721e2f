use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("No rpcserver specified.")]
    MissingServer,

    #[error("No rpctext specified.")]
    MissingText,

    #[error("Upstream {target} did not answer in time")]
    Timeout { target: String },

    #[error("Upstream {target} failed: {message}")]
    Upstream { target: String, message: String },
}

impl RelayError {
    pub fn from_upstream(target: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RelayError::Timeout {
                target: target.to_string(),
            }
        } else {
            RelayError::Upstream {
                target: target.to_string(),
                message: err.to_string(),
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::MissingServer | RelayError::MissingText => StatusCode::BAD_REQUEST,
            RelayError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            RelayError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Relay request failed");
        }
        (status, self.to_string()).into_response()
    }
}
