//! Mock ClusterClient for unit testing
//!
//! In-memory implementation of `ClusterClientTrait` that records every status
//! write and can be told to fail individual operations.

use crate::cluster_trait::ClusterClientTrait;
use crate::error::ClusterError;
use crate::models::CredentialSecret;
use crds::FalconConfigStatus;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A recorded status write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    /// Namespace of the written resource
    pub namespace: String,
    /// Name of the written resource
    pub name: String,
    /// Status as written
    pub status: FalconConfigStatus,
}

#[derive(Debug, Default)]
struct MockState {
    secrets: HashMap<String, Vec<CredentialSecret>>,
    image_streams: HashMap<(String, String), Option<String>>,
    status_updates: Vec<StatusUpdate>,
    list_secrets_error: Option<String>,
    status_update_error: Option<String>,
}

/// Mock cluster client for testing
///
/// Clones share state, so a test can keep a handle while the reconciler owns another.
#[derive(Debug, Clone, Default)]
pub struct MockClusterClient {
    state: Arc<Mutex<MockState>>,
}

impl MockClusterClient {
    /// Create an empty mock cluster
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a secret to a namespace; list order follows insertion order
    pub fn add_secret(&self, namespace: &str, secret: CredentialSecret) {
        self.state()
            .secrets
            .entry(namespace.to_string())
            .or_default()
            .push(secret);
    }

    /// Register an image stream, optionally with its repository already assigned
    pub fn add_image_stream(&self, namespace: &str, name: &str, repository: Option<&str>) {
        self.state().image_streams.insert(
            (namespace.to_string(), name.to_string()),
            repository.map(ToString::to_string),
        );
    }

    /// Make `list_secrets` fail with the given message
    pub fn fail_list_secrets(&self, message: &str) {
        self.state().list_secrets_error = Some(message.to_string());
    }

    /// Make `update_falcon_config_status` fail with the given message
    pub fn fail_status_updates(&self, message: &str) {
        self.state().status_update_error = Some(message.to_string());
    }

    /// Every successful status write, in order
    pub fn status_updates(&self) -> Vec<StatusUpdate> {
        self.state().status_updates.clone()
    }

    /// Most recent successful status write for a resource
    pub fn last_status(&self, namespace: &str, name: &str) -> Option<FalconConfigStatus> {
        self.state()
            .status_updates
            .iter()
            .rev()
            .find(|u| u.namespace == namespace && u.name == name)
            .map(|u| u.status.clone())
    }
}

#[async_trait::async_trait]
impl ClusterClientTrait for MockClusterClient {
    async fn list_secrets(&self, namespace: &str) -> Result<Vec<CredentialSecret>, ClusterError> {
        let state = self.state();
        if let Some(message) = &state.list_secrets_error {
            return Err(ClusterError::Api(message.clone()));
        }
        Ok(state.secrets.get(namespace).cloned().unwrap_or_default())
    }

    async fn get_image_stream_repository(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<String>, ClusterError> {
        self.state()
            .image_streams
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| ClusterError::NotFound(format!("image stream {namespace}/{name}")))
    }

    async fn update_falcon_config_status(
        &self,
        namespace: &str,
        name: &str,
        status: &FalconConfigStatus,
    ) -> Result<(), ClusterError> {
        let mut state = self.state();
        if let Some(message) = &state.status_update_error {
            return Err(ClusterError::Api(message.clone()));
        }
        state.status_updates.push(StatusUpdate {
            namespace: namespace.to_string(),
            name: name.to_string(),
            status: status.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_secrets_are_namespace_scoped() {
        let mock = MockClusterClient::new();
        mock.add_secret("ns1", CredentialSecret::new("a"));
        mock.add_secret("ns2", CredentialSecret::new("b"));

        let secrets = mock.list_secrets("ns1").await.unwrap();
        assert_eq!(secrets.len(), 1);
        assert_eq!(secrets[0].name, "a");
        assert!(mock.list_secrets("other").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_image_stream_is_not_found() {
        let mock = MockClusterClient::new();
        let err = mock
            .get_image_stream_repository("ns1", "falcon-container")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_failed_status_write_is_not_recorded() {
        let mock = MockClusterClient::new();
        mock.fail_status_updates("conflict");

        let result = mock
            .update_falcon_config_status("ns1", "falcon", &FalconConfigStatus::configuring())
            .await;
        assert!(matches!(result, Err(ClusterError::Api(_))));
        assert!(mock.status_updates().is_empty());
    }
}
