pub mod display;
pub mod poller;
pub mod publisher;

pub use display::{render, DisplayModel, PoolTable, ERROR_MESSAGE};
pub use poller::Poller;
pub use publisher::{DisplayHandle, DisplayPublisher, MonitorFrame, PollState};
