//! Layered configuration.
//!
//! Lowest to highest priority: built-in defaults, `<dir>/default.toml`,
//! `<dir>/local.toml`, then `MONITOR__SECTION__KEY` environment variables.
//! Both files are optional.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::errors::SettingsError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub monitor: MonitorSettings,
    pub gateway: GatewaySettings,
    pub relay: RelaySettings,
}

/// What to poll and how often. Read once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSettings {
    pub endpoint: String,
    pub method: String,
    pub poll_interval_ms: u64,
    pub request_timeout_ms: u64,
}

impl MonitorSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySettings {
    /// When set, calls go through this relay instead of straight to the endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relay_url: Option<String>,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelaySettings {
    pub host: String,
    pub port: u16,
    pub path: String,
    pub max_body_bytes: usize,
    pub upstream_timeout_ms: u64,
}

impl RelaySettings {
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            monitor: MonitorSettings {
                endpoint: "http://localhost:8111/".to_string(),
                method: "get_json_resource".to_string(),
                poll_interval_ms: 10_000,
                request_timeout_ms: 5_000,
            },
            gateway: GatewaySettings {
                relay_url: None,
                user_agent: "cloud-pool-monitor XML-RPC client".to_string(),
            },
            relay: RelaySettings {
                host: "127.0.0.1".to_string(),
                port: 8112,
                path: "/xmlrpc-socket".to_string(),
                max_body_bytes: 64 * 1024,
                upstream_timeout_ms: 10_000,
            },
        }
    }
}

impl Settings {
    /// `CONFIG_PATH`, falling back to `./config`.
    pub fn default_dir() -> PathBuf {
        PathBuf::from(std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config".to_string()))
    }

    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let dir = dir.as_ref();
        info!("Loading configuration from path: {}", dir.display());

        let defaults = Settings::default();
        let config = Config::builder()
            .set_default("monitor.endpoint", defaults.monitor.endpoint)?
            .set_default("monitor.method", defaults.monitor.method)?
            .set_default("monitor.poll_interval_ms", defaults.monitor.poll_interval_ms as i64)?
            .set_default("monitor.request_timeout_ms", defaults.monitor.request_timeout_ms as i64)?
            .set_default("gateway.user_agent", defaults.gateway.user_agent)?
            .set_default("relay.host", defaults.relay.host)?
            .set_default("relay.port", i64::from(defaults.relay.port))?
            .set_default("relay.path", defaults.relay.path)?
            .set_default("relay.max_body_bytes", defaults.relay.max_body_bytes as i64)?
            .set_default("relay.upstream_timeout_ms", defaults.relay.upstream_timeout_ms as i64)?
            .add_source(File::with_name(&dir.join("default").to_string_lossy()).required(false))
            .add_source(File::with_name(&dir.join("local").to_string_lossy()).required(false))
            .add_source(
                Environment::with_prefix("MONITOR")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.monitor.endpoint.trim().is_empty() {
            return Err(SettingsError::Invalid("monitor.endpoint must not be empty".into()));
        }
        if self.monitor.method.trim().is_empty() {
            return Err(SettingsError::Invalid("monitor.method must not be empty".into()));
        }
        if self.monitor.poll_interval_ms == 0 {
            return Err(SettingsError::Invalid("monitor.poll_interval_ms must be positive".into()));
        }
        if self.monitor.request_timeout_ms == 0 {
            return Err(SettingsError::Invalid("monitor.request_timeout_ms must be positive".into()));
        }
        if !self.relay.path.starts_with('/') {
            return Err(SettingsError::Invalid("relay.path must start with '/'".into()));
        }
        Ok(())
    }
}
