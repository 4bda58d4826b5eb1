//! Image publisher boundary
//!
//! The Phase Engine hands the API credentials, the registry push credential and the
//! build target to an [`ImagePublisher`] and waits for it to finish. The production
//! implementation is [`RegistryPublisher`], which copies the Falcon Container image
//! from the CrowdStrike registry into the namespace's image stream.

mod falcon_api;
mod registry;

#[cfg(test)]
mod mock;

pub use registry::RegistryPublisher;

#[cfg(test)]
pub use mock::MockImagePublisher;

use crate::credentials::RegistryCredential;
use async_trait::async_trait;
use crds::FalconApi;
use thiserror::Error;

/// Errors raised while publishing the Falcon Container image
///
/// Messages carry the cause verbatim; the Phase Engine adds its own context.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Falcon API request failed at the HTTP level
    #[error("{0}")]
    FalconApi(#[from] reqwest::Error),

    /// Falcon API rejected the client credentials or returned no token
    #[error("Falcon API authentication failed: {0}")]
    Authentication(String),

    /// Registry credentials could not be assembled
    #[error("invalid registry credential: {0}")]
    Credential(String),

    /// Local I/O (auth file, process spawn) failed
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// Image copy exited with an error
    #[error("image copy failed: {0}")]
    Copy(String),

    /// Any other publisher failure
    #[error("{0}")]
    Failed(String),
}

/// Publishes the Falcon Container image into a build target repository
#[async_trait]
pub trait ImagePublisher: Send + Sync {
    /// Push the image to `repository`, using `credential` for the push side
    async fn publish(
        &self,
        api: &FalconApi,
        credential: &RegistryCredential,
        repository: &str,
    ) -> Result<(), PublishError>;
}
