//! # Build-Target Resolver
//!
//! Resolves the registry repository the `falcon-container` image stream is
//! backed by.

use crate::error::ControllerError;
use cluster_client::ClusterClientTrait;
use tracing::debug;

/// Image stream the Falcon Container image is published into
pub const IMAGE_STREAM_NAME: &str = "falcon-container";

/// Repository of the `falcon-container` image stream in `namespace`
///
/// Any lookup failure, and an image stream with no repository assigned yet,
/// is reported as `ControllerError::TargetUnavailable`.
pub async fn resolve_build_target(
    client: &dyn ClusterClientTrait,
    namespace: &str,
) -> Result<String, ControllerError> {
    let repository = client
        .get_image_stream_repository(namespace, IMAGE_STREAM_NAME)
        .await
        .map_err(|e| ControllerError::TargetUnavailable(e.to_string()))?;

    match repository {
        Some(repository) if !repository.trim().is_empty() => {
            debug!("Image stream {}/{} resolves to {}", namespace, IMAGE_STREAM_NAME, repository);
            Ok(repository)
        }
        _ => Err(ControllerError::TargetUnavailable(format!(
            "image stream {namespace}/{IMAGE_STREAM_NAME} has no docker image repository"
        ))),
    }
}
