//! `Building` phase.
//!
//! One pass runs three steps in order, each awaited before the next:
//! locate the builder `.dockercfg`, resolve the `falcon-container` image
//! stream, and publish the Falcon Container image into it. Success moves the
//! resource to `Configuring`; the first failing step ends it in `Done` with the
//! failure recorded in `errorMessage`.

use super::{Reconciler, resource_identity};
use crate::build_target::resolve_build_target;
use crate::credentials::locate_dockercfg;
use crate::error::ControllerError;
use crds::{FalconConfig, FalconConfigStatus};
use tracing::{error, info, warn};

/// Context of a credential lookup failure
pub const CONTEXT_CREDENTIAL: &str = "Cannot find dockercfg secret from the current namespace";

/// Context of a build target failure
pub const CONTEXT_BUILD_TARGET: &str = "Cannot access image stream";

/// Context of a publish failure
pub const CONTEXT_PUBLISH: &str = "Cannot refresh Falcon Container Image";

impl Reconciler {
    /// Run one `Building` pass and return the status that was written.
    ///
    /// # Errors
    /// * `ControllerError::Transition` - a step failed; `{Done, message}` was
    ///   written (best effort)
    /// * `ControllerError::Persistence` - every step succeeded but the
    ///   `Configuring` status could not be written
    pub async fn reconcile_building(
        &self,
        resource: &FalconConfig,
    ) -> Result<FalconConfigStatus, ControllerError> {
        let (namespace, name) = resource_identity(resource)?;
        info!("Reconciling FalconConfig {}/{} in phase Building", namespace, name);

        let credential = match locate_dockercfg(self.cluster.as_ref(), &namespace).await {
            Ok(credential) => credential,
            Err(e) => {
                return Err(self.fail_building(&namespace, &name, CONTEXT_CREDENTIAL, e).await);
            }
        };

        let repository = match resolve_build_target(self.cluster.as_ref(), &namespace).await {
            Ok(repository) => repository,
            Err(e) => {
                return Err(self.fail_building(&namespace, &name, CONTEXT_BUILD_TARGET, e).await);
            }
        };

        if let Err(e) = self
            .publisher
            .publish(&resource.spec.falcon_api, &credential, &repository)
            .await
        {
            return Err(self.fail_building(&namespace, &name, CONTEXT_PUBLISH, e.into()).await);
        }

        let status = FalconConfigStatus::configuring();
        self.cluster
            .update_falcon_config_status(&namespace, &name, &status)
            .await
            .map_err(|e| {
                error!("Failed to update status for FalconConfig {}/{}: {}", namespace, name, e);
                ControllerError::Persistence(e)
            })?;

        info!(
            "FalconConfig {}/{} published to {}, moving to phase {}",
            namespace, name, repository, status.phase
        );
        Ok(status)
    }

    /// Record a failed step as `{Done, "<context>: <cause>"}` and build the error to return.
    ///
    /// The status write is best effort. Its failure is logged and kept on the
    /// returned `Transition` error; it never replaces the original cause.
    pub async fn fail_building(
        &self,
        namespace: &str,
        name: &str,
        context: &str,
        cause: ControllerError,
    ) -> ControllerError {
        let message = format!("{context}: {cause}");
        error!("FalconConfig {}/{}: {}", namespace, name, message);

        let status = FalconConfigStatus::failed(message.clone());
        let status_write_error = match self
            .cluster
            .update_falcon_config_status(namespace, name, &status)
            .await
        {
            Ok(()) => None,
            Err(e) => {
                warn!(
                    "Failed to record error status on FalconConfig {}/{}: {}",
                    namespace, name, e
                );
                Some(e)
            }
        };

        ControllerError::Transition {
            message,
            source: Box::new(cause),
            status_write_error,
        }
    }
}
