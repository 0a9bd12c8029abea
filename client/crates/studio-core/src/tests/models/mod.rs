mod build_status;
mod health_state;
mod preview;
mod project_status;
