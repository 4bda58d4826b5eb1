//! Registry publisher
//!
//! Copies the Falcon Container sensor image from the CrowdStrike registry into
//! the image stream repository with `skopeo`. Each call gets its own private
//! auth file, merged from the namespace's `.dockercfg` (push side) and the
//! Falcon registry login (pull side), removed when the call returns.

use super::falcon_api::{FalconApiClient, registry_host, registry_login, sensor_image};
use super::{ImagePublisher, PublishError};
use crate::credentials::{RegistryCredential, write_scoped_credential};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use crds::FalconApi;
use serde_json::{Map, Value, json};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

/// Tag copied from the Falcon registry and pushed to the image stream
pub const IMAGE_TAG: &str = "latest";

/// Publishes the image with `skopeo copy`
#[derive(Debug, Clone)]
pub struct RegistryPublisher {
    skopeo_path: PathBuf,
    dest_tls_verify: bool,
    api_base_url: Option<String>,
}

impl RegistryPublisher {
    pub fn new(skopeo_path: impl Into<PathBuf>, dest_tls_verify: bool) -> Self {
        Self {
            skopeo_path: skopeo_path.into(),
            dest_tls_verify,
            api_base_url: None,
        }
    }

    /// Talk to this Falcon API URL instead of the region default
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    async fn copy_image(
        &self,
        authfile: &Path,
        source: &str,
        destination: &str,
    ) -> Result<(), PublishError> {
        debug!("Copying {} to {}", source, destination);

        let output = Command::new(&self.skopeo_path)
            .arg("copy")
            .arg("--authfile")
            .arg(authfile)
            .arg(format!("--dest-tls-verify={}", self.dest_tls_verify))
            .arg(source)
            .arg(destination)
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(PublishError::Copy(if stderr.is_empty() {
                output.status.to_string()
            } else {
                stderr
            }));
        }
        Ok(())
    }
}

/// Merge a `.dockercfg` blob with a pull login for `registry` into an auth file
///
/// Both the legacy layout (registries at the top level) and the
/// `{"auths": {...}}` layout are accepted.
pub fn build_authfile(
    dockercfg: &RegistryCredential,
    registry: &str,
    username: &str,
    password: &str,
) -> Result<Vec<u8>, PublishError> {
    let parsed: Value = serde_json::from_slice(dockercfg.as_bytes())
        .map_err(|e| PublishError::Credential(format!(".dockercfg is not valid JSON: {e}")))?;

    let mut auths: Map<String, Value> = match parsed {
        Value::Object(mut cfg) => match cfg.remove("auths") {
            Some(Value::Object(auths)) => auths,
            Some(_) => {
                return Err(PublishError::Credential(
                    ".dockercfg auths is not an object".to_string(),
                ));
            }
            None => cfg,
        },
        _ => {
            return Err(PublishError::Credential(
                ".dockercfg is not a JSON object".to_string(),
            ));
        }
    };

    let login = STANDARD.encode(format!("{username}:{password}"));
    auths.insert(registry.to_string(), json!({ "auth": login }));

    serde_json::to_vec(&json!({ "auths": auths }))
        .map_err(|e| PublishError::Credential(e.to_string()))
}

#[async_trait]
impl ImagePublisher for RegistryPublisher {
    async fn publish(
        &self,
        api: &FalconApi,
        credential: &RegistryCredential,
        repository: &str,
    ) -> Result<(), PublishError> {
        let session = match &self.api_base_url {
            Some(url) => FalconApiClient::login_at(api, url).await?,
            None => FalconApiClient::login(api).await?,
        };

        let cid = match api.cid.as_deref().filter(|cid| !cid.is_empty()) {
            Some(cid) => cid.to_string(),
            None => session.customer_id().await?,
        };
        let token = session.registry_token().await?;

        let region = api.cloud_region;
        let authfile = build_authfile(
            credential,
            registry_host(region),
            &registry_login(&cid),
            &token,
        )?;

        // Dropping the directory removes the auth file on every path out of here
        let dir = tempfile::Builder::new().prefix("falcon-publish-").tempdir()?;
        let authfile_path = dir.path().join("auth.json");
        write_scoped_credential(&authfile_path, &authfile)?;

        let source = format!("docker://{}:{IMAGE_TAG}", sensor_image(region));
        let destination = format!("docker://{repository}:{IMAGE_TAG}");
        self.copy_image(&authfile_path, &source, &destination).await?;

        info!("Published Falcon Container image to {}", repository);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_auths(authfile: &[u8]) -> Map<String, Value> {
        let value: Value = serde_json::from_slice(authfile).unwrap();
        value["auths"].as_object().unwrap().clone()
    }

    #[test]
    fn test_legacy_dockercfg_is_wrapped_and_merged() {
        let dockercfg = RegistryCredential::new(
            json!({
                "image-registry.openshift-image-registry.svc:5000": {
                    "auth": "YnVpbGRlcjp0b2tlbg=="
                }
            })
            .to_string(),
        );

        let authfile =
            build_authfile(&dockercfg, "registry.crowdstrike.com", "fc-abc", "pull-token").unwrap();
        let auths = decode_auths(&authfile);

        assert_eq!(
            auths["image-registry.openshift-image-registry.svc:5000"]["auth"],
            "YnVpbGRlcjp0b2tlbg=="
        );
        assert_eq!(
            auths["registry.crowdstrike.com"]["auth"],
            STANDARD.encode("fc-abc:pull-token")
        );
    }

    #[test]
    fn test_auths_layout_is_accepted() {
        let dockercfg =
            RegistryCredential::new(br#"{"auths":{"r.example":{"auth":"eA=="}}}"#.to_vec());

        let authfile = build_authfile(&dockercfg, "registry.crowdstrike.com", "u", "p").unwrap();
        let auths = decode_auths(&authfile);
        assert_eq!(auths.len(), 2);
        assert!(auths.contains_key("r.example"));
    }

    #[test]
    fn test_malformed_dockercfg_is_credential_error() {
        for blob in [&b"not json"[..], &b"[1,2]"[..], &br#"{"auths":"x"}"#[..]] {
            let dockercfg = RegistryCredential::new(blob.to_vec());
            let err = build_authfile(&dockercfg, "r", "u", "p").unwrap_err();
            assert!(matches!(err, PublishError::Credential(_)));
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_copy_reports_copy_error() {
        let dir = tempfile::tempdir().unwrap();
        let authfile = dir.path().join("auth.json");
        std::fs::write(&authfile, b"{}").unwrap();

        let publisher = RegistryPublisher::new("false", false);
        let err = publisher
            .copy_image(&authfile, "docker://src:latest", "docker://dst:latest")
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::Copy(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_copy() {
        let dir = tempfile::tempdir().unwrap();
        let authfile = dir.path().join("auth.json");
        std::fs::write(&authfile, b"{}").unwrap();

        let publisher = RegistryPublisher::new("true", false);
        publisher
            .copy_image(&authfile, "docker://src:latest", "docker://dst:latest")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_missing_binary_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = RegistryPublisher::new(dir.path().join("no-such-skopeo"), false);

        let err = publisher
            .copy_image(&dir.path().join("auth.json"), "docker://a", "docker://b")
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::Io(_)));
    }
}
