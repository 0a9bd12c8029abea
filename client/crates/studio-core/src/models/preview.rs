use crate::{DevServerHealthState, ProjectStatus};

/// True when an address is present and non-empty.
pub fn has_preview_address(preview_address: Option<&str>) -> bool {
    preview_address.is_some_and(|address| !address.trim().is_empty())
}

/// The single readiness gate for the live preview.
///
/// Ready iff the project is `active`, a preview address is known and the dev
/// server reports `ready`.
pub fn preview_ready(
    status: Option<ProjectStatus>,
    preview_address: Option<&str>,
    health: DevServerHealthState,
) -> bool {
    status == Some(ProjectStatus::Active)
        && has_preview_address(preview_address)
        && health == DevServerHealthState::Ready
}
