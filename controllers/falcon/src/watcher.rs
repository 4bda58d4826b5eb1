//! Kubernetes resource watcher.
//!
//! Watches `FalconConfig` resources and drives reconciliation through
//! `kube_runtime::Controller`, which keeps at most one reconciliation in
//! flight per object and reconnects the watch on its own.

use crate::error::ControllerError;
use crate::reconciler::{Reconciler, resource_key};
use crds::FalconConfig;
use futures::StreamExt;
use kube::{Api, ResourceExt};
use kube_runtime::{
    Controller, watcher,
    controller::{Action, Config as RuntimeConfig},
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

async fn reconcile(
    obj: Arc<FalconConfig>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ControllerError> {
    debug!(
        "Reconciling FalconConfig {}/{}",
        obj.namespace().unwrap_or_default(),
        obj.name_any()
    );
    ctx.reconcile(&obj).await
}

/// Requeue with the resource's Fibonacci backoff.
///
/// A failed Building pass has already moved the resource to `Done`, so the
/// requeue only observes that state again.
fn error_policy(obj: Arc<FalconConfig>, error: &ControllerError, ctx: Arc<Reconciler>) -> Action {
    let key = resource_key(&obj.namespace().unwrap_or_default(), &obj.name_any());
    let (delay, error_count) = ctx.next_backoff(&key);

    if let ControllerError::Transition { status_write_error: Some(write_error), .. } = error {
        warn!("Error status for FalconConfig {} was not persisted: {}", key, write_error);
    }
    error!(
        "Reconciliation error for FalconConfig {} (attempt {}), requeueing in {}s: {}",
        key,
        error_count,
        delay.as_secs(),
        error
    );
    Action::requeue(delay)
}

/// Watches `FalconConfig` resources.
pub struct Watcher {
    reconciler: Arc<Reconciler>,
    api: Api<FalconConfig>,
    concurrency: u16,
}

impl Watcher {
    pub fn new(reconciler: Arc<Reconciler>, api: Api<FalconConfig>, concurrency: u16) -> Self {
        Self {
            reconciler,
            api,
            concurrency,
        }
    }

    /// Watch until the stream ends.
    pub async fn watch_falcon_configs(&self) -> Result<(), ControllerError> {
        info!("Starting FalconConfig watcher (concurrency {})", self.concurrency);

        let runtime_config = RuntimeConfig::default()
            .debounce(Duration::from_secs(1))
            .concurrency(self.concurrency);

        Controller::new(self.api.clone(), watcher::Config::default())
            .with_config(runtime_config)
            .shutdown_on_signal()
            .run(reconcile, error_policy, self.reconciler.clone())
            .for_each(|res| async move {
                match res {
                    Ok((obj, _)) => debug!("Reconciled FalconConfig {}", obj.name),
                    Err(e) => error!("Controller error for FalconConfig: {}", e),
                }
            })
            .await;

        info!("FalconConfig watcher stopped");
        Ok(())
    }
}
