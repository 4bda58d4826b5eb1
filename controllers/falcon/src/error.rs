//! Controller-specific error types.
//!
//! This module defines error types specific to the Falcon Controller
//! that are not covered by upstream library errors.

use crate::publisher::PublishError;
use cluster_client::ClusterError;
use pki::PkiError;
use thiserror::Error;

/// Errors that can occur in the Falcon Controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// No secret in the namespace carries a usable registry push credential
    #[error("Cannot find suitable secret in namespace {0} to push falcon-image to the registry")]
    CredentialNotFound(String),

    /// Cluster API call failed
    #[error("{0}")]
    Transport(#[source] ClusterError),

    /// Image-stream build target could not be resolved
    #[error("{0}")]
    TargetUnavailable(String),

    /// Image build/push failed
    #[error(transparent)]
    Publish(#[from] PublishError),

    /// Status write failed
    #[error("Failed to update status: {0}")]
    Persistence(#[source] ClusterError),

    /// A phase step failed; the message was recorded on the resource status.
    ///
    /// `status_write_error` holds the failure of that status write, if any.
    /// It is reported here instead of being propagated.
    #[error("{message}")]
    Transition {
        /// Message written to `status.errorMessage`
        message: String,
        /// Underlying step failure
        #[source]
        source: Box<ControllerError>,
        /// Swallowed failure of the best-effort status write
        status_write_error: Option<ClusterError>,
    },

    /// Kubernetes client error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// Certificate authority error
    #[error("PKI error: {0}")]
    Pki(#[from] PkiError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}
