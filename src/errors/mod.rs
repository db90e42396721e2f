use std::time::Duration;
use thiserror::Error;

/// Everything that can go wrong inside one refresh cycle.
///
/// None of these escape the poll loop: each one is logged and replaced by the
/// fixed error view before the next cycle is scheduled.
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Transport Error: {0}")]
    Transport(#[from] GatewayError),

    #[error("Envelope Error: {0}")]
    Envelope(#[from] EnvelopeNotFound),

    #[error("Decode Error: {0}")]
    Decode(#[from] DecodeError),
}

impl MonitorError {
    /// Stable label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            MonitorError::Transport(_) => "transport",
            MonitorError::Envelope(_) => "envelope",
            MonitorError::Decode(_) => "decode",
        }
    }
}

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Request to {endpoint} failed: {message}")]
    Request {
        endpoint: String,
        message: String,
    },

    #[error("{endpoint} answered with HTTP {status}")]
    Status {
        endpoint: String,
        status: u16,
    },

    #[error("No response from {endpoint} within {timeout:?}")]
    Timeout {
        endpoint: String,
        timeout: Duration,
    },

    #[error("RPC fault returned by {endpoint}")]
    Fault {
        endpoint: String,
    },

    #[error("Empty response from {endpoint}")]
    Empty {
        endpoint: String,
    },
}

impl GatewayError {
    pub fn from_reqwest(endpoint: &str, timeout: Duration, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout {
                endpoint: endpoint.to_string(),
                timeout,
            }
        } else {
            GatewayError::Request {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
            }
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("No structured payload found in response")]
pub struct EnvelopeNotFound;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Payload is not valid JSON (line {line}, column {column}): {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Payload does not describe a resource pool: {message}")]
    Shape {
        message: String,
    },
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        use serde_json::error::Category;

        match err.classify() {
            Category::Syntax | Category::Eof | Category::Io => DecodeError::Syntax {
                line: err.line(),
                column: err.column(),
                message: err.to_string(),
            },
            Category::Data => DecodeError::Shape {
                message: err.to_string(),
            },
        }
    }
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// Result type alias for convenience
pub type MonitorResult<T> = Result<T, MonitorError>;
