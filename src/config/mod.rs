pub mod settings;

pub use settings::{GatewaySettings, MonitorSettings, RelaySettings, Settings};
