//! ClusterClient trait for mocking
//!
//! The concrete `KubeClusterClient` implements this trait, and reconciler tests
//! swap in `MockClusterClient`.

use crate::error::ClusterError;
use crate::models::CredentialSecret;
use crds::FalconConfigStatus;

/// Cluster API operations needed by the reconcilers
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait ClusterClientTrait: Send + Sync {
    /// List every secret in `namespace`.
    ///
    /// The order of the returned secrets is whatever the API server produced
    /// and carries no meaning.
    async fn list_secrets(&self, namespace: &str) -> Result<Vec<CredentialSecret>, ClusterError>;

    /// Read `status.dockerImageRepository` of the named image stream.
    ///
    /// Returns `Ok(None)` when the image stream exists but has not been
    /// assigned a repository yet.
    async fn get_image_stream_repository(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<String>, ClusterError>;

    /// Replace the status of a `FalconConfig` in a single write.
    async fn update_falcon_config_status(
        &self,
        namespace: &str,
        name: &str,
        status: &FalconConfigStatus,
    ) -> Result<(), ClusterError>;
}
