//! Falcon Controller
//!
//! Drives `FalconConfig` resources through the Building phase: finds the
//! namespace's builder push credential, resolves the `falcon-container` image
//! stream, and publishes the Falcon Container image into it.

mod backoff;
mod build_target;
mod config;
mod controller;
mod credentials;
mod error;
mod publisher;
mod reconciler;
#[cfg(test)]
mod test_utils;
mod watcher;

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use controller::Controller;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Must happen before any kube or reqwest client is built
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| {
            ControllerError::InvalidConfig("rustls crypto provider already installed".to_string())
        })?;

    info!("Starting Falcon Controller");

    let config = ControllerConfig::from_env()?;

    let pki = pki::bootstrap(&config.namespace_file)?;
    let namespace = config
        .watch_namespace
        .clone()
        .unwrap_or_else(|| pki.identity.namespace.clone());

    info!("Configuration:");
    info!("  Operator namespace: {}", pki.identity.namespace);
    info!("  Watch namespace: {}", namespace);
    info!("  skopeo: {}", config.skopeo_path.display());
    info!("  Concurrency: {}", config.concurrency);

    let controller = Controller::new(&config, &namespace, pki.ca).await?;
    controller.run().await?;

    Ok(())
}
