pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod dashboard;
pub mod errors;
pub mod gateway;
pub mod monitoring;

// Re-exports
pub use crate::config::Settings;
pub use crate::core::{decode, extract, ResourcePool};
pub use crate::errors::{MonitorError, MonitorResult};
pub use crate::gateway::RemoteCall;
pub use crate::monitoring::{render, DisplayHandle, DisplayModel, MonitorFrame, PollState, Poller};
