//! Cluster client errors

use thiserror::Error;

/// Errors that can occur when talking to the cluster API
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Kubernetes API request failed (transport, auth, or server-side)
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// Requested object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other API failure
    #[error("Cluster API error: {0}")]
    Api(String),
}

impl ClusterError {
    /// Whether the API reported the object as missing.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Kube(kube::Error::Api(response)) => response.code == 404,
            _ => false,
        }
    }
}
