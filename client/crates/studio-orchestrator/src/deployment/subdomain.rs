use crate::{OrchestratorError, OrchestratorResult};

const MAX_LABEL_LEN: usize = 63;

/// Trim, lowercase and check a requested subdomain against DNS label rules:
/// 1-63 characters of `[a-z0-9-]`, no leading or trailing hyphen.
#[track_caller]
pub fn normalize_subdomain(raw: &str) -> OrchestratorResult<String> {
    let name = raw.trim().to_ascii_lowercase();

    if name.is_empty() {
        return Err(OrchestratorError::invalid_subdomain(raw, "name is empty"));
    }
    if name.len() > MAX_LABEL_LEN {
        return Err(OrchestratorError::invalid_subdomain(
            raw,
            "name is longer than 63 characters",
        ));
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        return Err(OrchestratorError::invalid_subdomain(
            raw,
            "only letters, digits and hyphens are allowed",
        ));
    }
    if name.starts_with('-') || name.ends_with('-') {
        return Err(OrchestratorError::invalid_subdomain(
            raw,
            "name cannot start or end with a hyphen",
        ));
    }

    Ok(name)
}

/// `<name>.<suffix>`
pub fn public_address(subdomain: &str, suffix: &str) -> String {
    format!("{}.{}", subdomain, suffix.trim_matches('.'))
}
