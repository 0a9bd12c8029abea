use studio_core::BuildStatus;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// `POST /projects/{id}/deploy`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployRequest {
    pub subdomain_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_domain_id: Option<String>,
}

/// `GET /projects/{id}/deployment-status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentStatusResponse {
    /// Raw remote status; see [`DeploymentStatusResponse::build_status`]
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub subdomain_name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub custom_domains: Vec<String>,
}

impl DeploymentStatusResponse {
    /// Normalized status; `None` for absent or unrecognized values.
    pub fn build_status(&self) -> Option<BuildStatus> {
        self.status
            .as_deref()
            .and_then(|raw| BuildStatus::from_str(raw).ok())
    }
}

/// `GET /subdomains/{name}/availability`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubdomainAvailability {
    pub available: bool,
}

/// `POST /projects/{id}/unpublish`
///
/// Exactly one of the two fields is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnpublishRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unpublish_subdomain: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_domain_id: Option<String>,
}

impl UnpublishRequest {
    pub fn subdomain() -> Self {
        Self {
            unpublish_subdomain: Some(true),
            custom_domain_id: None,
        }
    }

    pub fn custom_domain(id: impl Into<String>) -> Self {
        Self {
            unpublish_subdomain: None,
            custom_domain_id: Some(id.into()),
        }
    }
}
