//! kube-backed cluster client

use crate::cluster_trait::ClusterClientTrait;
use crate::error::ClusterError;
use crate::models::CredentialSecret;
use crds::{FalconConfig, FalconConfigStatus};
use k8s_openapi::api::core::v1::Secret;
use kube::{
    Client,
    api::{Api, ApiResource, ListParams, Patch, PatchParams},
    core::{DynamicObject, GroupVersionKind},
};
use serde_json::json;
use tracing::debug;

/// Cluster client backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeClusterClient {
    client: Client,
    image_stream: ApiResource,
}

impl std::fmt::Debug for KubeClusterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeClusterClient").finish_non_exhaustive()
    }
}

impl KubeClusterClient {
    /// Wraps an existing kube client
    pub fn new(client: Client) -> Self {
        // OpenShift image streams have no typed binding in k8s-openapi
        let gvk = GroupVersionKind {
            group: "image.openshift.io".to_string(),
            version: "v1".to_string(),
            kind: "ImageStream".to_string(),
        };

        Self {
            client,
            image_stream: ApiResource::from_gvk(&gvk),
        }
    }

    /// Underlying kube client
    pub fn kube_client(&self) -> &Client {
        &self.client
    }
}

#[async_trait::async_trait]
impl ClusterClientTrait for KubeClusterClient {
    async fn list_secrets(&self, namespace: &str) -> Result<Vec<CredentialSecret>, ClusterError> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        // No limit set: the API server returns the complete list in one response
        let secrets = api.list(&ListParams::default()).await?;

        debug!("Listed {} secrets in namespace {}", secrets.items.len(), namespace);
        Ok(secrets.items.into_iter().map(CredentialSecret::from).collect())
    }

    async fn get_image_stream_repository(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<String>, ClusterError> {
        let api: Api<DynamicObject> =
            Api::namespaced_with(self.client.clone(), namespace, &self.image_stream);

        let image_stream = match api.get(name).await {
            Ok(obj) => obj,
            Err(kube::Error::Api(api_err)) if api_err.code == 404 => {
                return Err(ClusterError::NotFound(format!(
                    "image stream {namespace}/{name}"
                )));
            }
            Err(e) => return Err(ClusterError::Kube(e)),
        };

        let repository = image_stream
            .data
            .get("status")
            .and_then(|s| s.get("dockerImageRepository"))
            .and_then(|r| r.as_str())
            .map(ToString::to_string);

        Ok(repository)
    }

    async fn update_falcon_config_status(
        &self,
        namespace: &str,
        name: &str,
        status: &FalconConfigStatus,
    ) -> Result<(), ClusterError> {
        let api: Api<FalconConfig> = Api::namespaced(self.client.clone(), namespace);

        // Phase and errorMessage always travel together in one patch
        let status_patch = json!({
            "status": status
        });

        api.patch_status(name, &PatchParams::default(), &Patch::Merge(&status_patch))
            .await?;

        debug!(
            "Patched FalconConfig {}/{} status: phase={}",
            namespace, name, status.phase
        );
        Ok(())
    }
}
