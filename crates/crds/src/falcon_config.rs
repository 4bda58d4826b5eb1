//! FalconConfig CRD
//!
//! Drives the Falcon Container image through its provisioning phases.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "falcon.crowdstrike.com",
    version = "v1alpha1",
    kind = "FalconConfig",
    namespaced,
    status = "FalconConfigStatus",
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Error","type":"string","jsonPath":".status.errorMessage"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct FalconConfigSpec {
    /// CrowdStrike Falcon API credentials used to pull the sensor image
    pub falcon_api: FalconApi,
}

/// Falcon API credential sub-config
#[derive(Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FalconApi {
    /// OAuth2 API client ID
    pub client_id: String,

    /// OAuth2 API client secret
    pub client_secret: String,

    /// Falcon cloud region
    #[serde(default)]
    pub cloud_region: CloudRegion,

    /// Customer ID; looked up through the API when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cid: Option<String>,
}

impl fmt::Debug for FalconApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FalconApi")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("cloud_region", &self.cloud_region)
            .field("cid", &self.cid)
            .finish()
    }
}

/// Falcon cloud region
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
pub enum CloudRegion {
    /// US-1 (default)
    #[default]
    #[serde(rename = "us-1")]
    Us1,

    /// US-2
    #[serde(rename = "us-2")]
    Us2,

    /// EU-1
    #[serde(rename = "eu-1")]
    Eu1,

    /// US-GOV-1
    #[serde(rename = "us-gov-1")]
    UsGov1,
}

impl CloudRegion {
    /// Region name as written in the CR
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Us1 => "us-1",
            Self::Us2 => "us-2",
            Self::Eu1 => "eu-1",
            Self::UsGov1 => "us-gov-1",
        }
    }
}

/// Provisioning phase
///
/// `Done` is terminal for both outcomes; a failed run is distinguished only by a
/// non-empty `errorMessage`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "PascalCase")]
pub enum Phase {
    /// Image is being built and pushed to the namespace's image stream
    #[default]
    Building,

    /// Image is published, cluster configuration is next
    Configuring,

    /// Terminal
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Building => "Building",
            Self::Configuring => "Configuring",
            Self::Done => "Done",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FalconConfigStatus {
    /// Current phase
    #[serde(default)]
    pub phase: Phase,

    /// Error from the last reconciliation, empty when healthy
    #[serde(default)]
    pub error_message: String,
}

impl FalconConfigStatus {
    /// Status after the image was published successfully.
    pub fn configuring() -> Self {
        Self {
            phase: Phase::Configuring,
            error_message: String::new(),
        }
    }

    /// Error-terminal status carrying `message`.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            phase: Phase::Done,
            error_message: message.into(),
        }
    }

    /// Whether this status records a failed reconciliation.
    pub fn is_failed(&self) -> bool {
        self.phase == Phase::Done && !self.error_message.is_empty()
    }
}

impl FalconConfig {
    /// Current phase; a resource without status starts in `Building`.
    pub fn phase(&self) -> Phase {
        self.status.as_ref().map(|s| s.phase).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_phase_pascal_case() {
        let status = FalconConfigStatus::failed("boom");
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["phase"], "Done");
        assert_eq!(json["errorMessage"], "boom");
    }

    #[test]
    fn test_configuring_clears_error_message() {
        let status = FalconConfigStatus::configuring();
        let json = serde_json::to_value(&status).unwrap();
        // Empty message must still be written so the merge patch clears stale errors
        assert_eq!(json["errorMessage"], "");
        assert!(!status.is_failed());
    }

    #[test]
    fn test_missing_status_defaults_to_building() {
        let config: FalconConfig = serde_json::from_value(serde_json::json!({
            "apiVersion": "falcon.crowdstrike.com/v1alpha1",
            "kind": "FalconConfig",
            "metadata": { "name": "falcon", "namespace": "ns1" },
            "spec": {
                "falconApi": { "clientId": "id", "clientSecret": "secret" }
            }
        }))
        .unwrap();

        assert_eq!(config.phase(), Phase::Building);
        assert_eq!(config.spec.falcon_api.cloud_region, CloudRegion::Us1);
    }

    #[test]
    fn test_cloud_region_round_trip_names() {
        let region: CloudRegion = serde_json::from_str("\"us-gov-1\"").unwrap();
        assert_eq!(region, CloudRegion::UsGov1);
        assert_eq!(region.as_str(), "us-gov-1");
    }

    #[test]
    fn test_debug_redacts_client_secret() {
        let api = FalconApi {
            client_id: "id".to_string(),
            client_secret: "hunter2".to_string(),
            cloud_region: CloudRegion::Eu1,
            cid: None,
        };
        assert!(!format!("{api:?}").contains("hunter2"));
    }
}
