pub mod envelope;
pub mod resource_pool;
pub mod vm;

pub use envelope::extract;
pub use resource_pool::{decode, Resource, ResourcePool};
pub use vm::{DisplayValue, StatusIndicator, Vm};
