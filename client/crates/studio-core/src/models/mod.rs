pub mod build_status;
pub mod deployment_state;
pub mod health_result;
pub mod health_state;
pub mod notice;
pub mod preview;
pub mod project_status;
pub mod restore_state;
