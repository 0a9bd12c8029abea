mod controller;
mod subdomain;

pub use controller::{DeploymentController, DeploymentSnapshot, UnpublishTarget};
pub use subdomain::{normalize_subdomain, public_address};
