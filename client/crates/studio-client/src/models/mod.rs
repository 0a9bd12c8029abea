pub mod deployment;
pub mod external_deployment;
pub mod project;
pub mod snapshot;
