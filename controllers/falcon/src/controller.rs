//! Main controller implementation.
//!
//! This module contains the `Controller` struct that wires the cluster client,
//! the image publisher and the certificate authority into a reconciler and
//! runs the `FalconConfig` watcher.

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::publisher::RegistryPublisher;
use crate::reconciler::Reconciler;
use crate::watcher::Watcher;
use cluster_client::KubeClusterClient;
use crds::FalconConfig;
use kube::{Api, Client};
use pki::CertificateAuthority;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Main controller for `FalconConfig` resources.
pub struct Controller {
    falcon_config_watcher: JoinHandle<Result<(), ControllerError>>,
}

impl Controller {
    /// Creates the controller and starts watching `namespace`.
    pub async fn new(
        config: &ControllerConfig,
        namespace: &str,
        ca: Arc<CertificateAuthority>,
    ) -> Result<Self, ControllerError> {
        info!("Initializing Falcon Controller");

        let kube_client = Client::try_default().await?;

        let mut publisher = RegistryPublisher::new(&config.skopeo_path, config.dest_tls_verify);
        if let Some(url) = &config.falcon_api_url {
            publisher = publisher.with_api_base_url(url);
        }

        let reconciler = Arc::new(
            Reconciler::new(
                Arc::new(KubeClusterClient::new(kube_client.clone())),
                Arc::new(publisher),
                ca,
            )
            .with_backoff(config.backoff_min_minutes, config.backoff_max_minutes),
        );
        info!(
            "Certificate authority for {} valid until {}",
            reconciler.certificate_authority().namespace(),
            reconciler.certificate_authority().not_after()
        );

        let api: Api<FalconConfig> = Api::namespaced(kube_client, namespace);
        let watcher = Watcher::new(reconciler, api, config.concurrency);

        let falcon_config_watcher =
            tokio::spawn(async move { watcher.watch_falcon_configs().await });

        Ok(Self {
            falcon_config_watcher,
        })
    }

    /// Runs the controller until the watcher stops.
    pub async fn run(self) -> Result<(), ControllerError> {
        info!("Falcon Controller running");

        self.falcon_config_watcher
            .await
            .map_err(|e| ControllerError::Watch(format!("FalconConfig watcher panicked: {e}")))?
            .map_err(|e| ControllerError::Watch(format!("FalconConfig watcher error: {e}")))?;

        info!("Falcon Controller stopped");
        Ok(())
    }
}
