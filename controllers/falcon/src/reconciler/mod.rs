//! Reconciliation logic for `FalconConfig`.
//!
//! The reconciler dispatches on `status.phase`. Only `Building` is handled here
//! (see [`building`]); the later phases belong to other controllers and are
//! left untouched.

pub mod building;


use crate::backoff::FibonacciBackoff;
use crate::error::ControllerError;
use crate::publisher::ImagePublisher;
use cluster_client::ClusterClientTrait;
use crds::{FalconConfig, Phase};
use kube::ResourceExt;
use kube_runtime::controller::Action;
use pki::CertificateAuthority;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

/// Backoff state for a resource
#[derive(Debug, Clone)]
struct BackoffState {
    backoff: FibonacciBackoff,
    error_count: u32,
}

impl BackoffState {
    fn new(min_minutes: u64, max_minutes: u64) -> Self {
        Self {
            backoff: FibonacciBackoff::new(min_minutes, max_minutes),
            error_count: 0,
        }
    }
}

/// Reconciles `FalconConfig` resources.
pub struct Reconciler {
    pub(crate) cluster: Arc<dyn ClusterClientTrait>,
    pub(crate) publisher: Arc<dyn ImagePublisher>,
    ca: Arc<CertificateAuthority>,
    backoff_bounds: (u64, u64),
    /// Error count tracking per resource (namespace/name -> BackoffState)
    backoff_states: Mutex<HashMap<String, BackoffState>>,
}

impl Reconciler {
    pub fn new(
        cluster: Arc<dyn ClusterClientTrait>,
        publisher: Arc<dyn ImagePublisher>,
        ca: Arc<CertificateAuthority>,
    ) -> Self {
        Self {
            cluster,
            publisher,
            ca,
            backoff_bounds: (1, 10),
            backoff_states: Mutex::new(HashMap::new()),
        }
    }

    /// Override the error requeue backoff bounds (minutes)
    #[must_use]
    pub fn with_backoff(mut self, min_minutes: u64, max_minutes: u64) -> Self {
        self.backoff_bounds = (min_minutes, max_minutes);
        self
    }

    /// The operator's certificate authority
    pub fn certificate_authority(&self) -> &Arc<CertificateAuthority> {
        &self.ca
    }

    /// Reconcile one `FalconConfig`.
    ///
    /// A resource without status is treated as `Building`. `Configuring` and
    /// `Done` are not written to and wait for the next change.
    pub async fn reconcile(&self, resource: &FalconConfig) -> Result<Action, ControllerError> {
        let (namespace, name) = resource_identity(resource)?;

        match resource.phase() {
            Phase::Building => {
                self.reconcile_building(resource).await?;
                self.reset_error(&resource_key(&namespace, &name));
            }
            phase => {
                debug!(
                    "FalconConfig {}/{} is in phase {}, nothing to do",
                    namespace, name, phase
                );
            }
        }

        Ok(Action::await_change())
    }

    /// Next requeue delay for a failing resource
    ///
    /// Returns (delay, error_count)
    pub fn next_backoff(&self, resource_key: &str) -> (Duration, u32) {
        let (min, max) = self.backoff_bounds;
        match self.backoff_states.lock() {
            Ok(mut states) => {
                let state = states
                    .entry(resource_key.to_string())
                    .or_insert_with(|| BackoffState::new(min, max));
                state.error_count += 1;
                (state.backoff.next_backoff(), state.error_count)
            }
            Err(e) => {
                warn!("Failed to lock backoff_states: {}, using minimum backoff", e);
                (Duration::from_secs(min.saturating_mul(60)), 1)
            }
        }
    }

    /// Forget the failure history of a resource after a successful reconcile
    pub fn reset_error(&self, resource_key: &str) {
        if let Ok(mut states) = self.backoff_states.lock() {
            states.remove(resource_key);
        }
    }

    #[cfg(test)]
    pub(crate) fn tracked_backoffs(&self) -> usize {
        self.backoff_states.lock().map_or(0, |states| states.len())
    }
}

/// `namespace/name` key used for backoff tracking
pub fn resource_key(namespace: &str, name: &str) -> String {
    format!("{namespace}/{name}")
}

/// Namespace and name of a resource; both are required
pub(crate) fn resource_identity(
    resource: &FalconConfig,
) -> Result<(String, String), ControllerError> {
    let namespace = resource.namespace().ok_or_else(|| {
        ControllerError::InvalidConfig(format!(
            "FalconConfig {} has no namespace",
            resource.name_any()
        ))
    })?;
    let name = resource
        .metadata
        .name
        .clone()
        .ok_or_else(|| ControllerError::InvalidConfig("FalconConfig has no name".to_string()))?;
    Ok((namespace, name))
}
