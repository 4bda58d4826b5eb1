//! Test utilities for unit testing reconcilers
//!
//! Helpers for building `FalconConfig` resources, builder secrets and a
//! reconciler wired to in-memory collaborators.

#[cfg(test)]
use crate::credentials::{
    BUILDER_SERVICE_ACCOUNT, DOCKERCFG_KEY, DOCKERCFG_SECRET_TYPE, SERVICE_ACCOUNT_ANNOTATION,
};
#[cfg(test)]
use crate::publisher::MockImagePublisher;
#[cfg(test)]
use crate::reconciler::Reconciler;
#[cfg(test)]
use cluster_client::{CredentialSecret, MockClusterClient};
#[cfg(test)]
use crds::{CloudRegion, FalconApi, FalconConfig, FalconConfigSpec, FalconConfigStatus};
#[cfg(test)]
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
#[cfg(test)]
use std::sync::Arc;

/// Helper to create a test FalconConfig, optionally with a status
#[cfg(test)]
pub fn create_test_falcon_config(
    name: &str,
    namespace: &str,
    status: Option<FalconConfigStatus>,
) -> FalconConfig {
    FalconConfig {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        spec: FalconConfigSpec {
            falcon_api: FalconApi {
                client_id: "test-client".to_string(),
                client_secret: "test-secret".to_string(),
                cloud_region: CloudRegion::Us1,
                cid: None,
            },
        },
        status,
    }
}

/// Helper to create a secret that passes every builder `.dockercfg` check
#[cfg(test)]
pub fn dockercfg_secret(name: &str, blob: &[u8]) -> CredentialSecret {
    CredentialSecret::new(name)
        .with_type(DOCKERCFG_SECRET_TYPE)
        .with_annotation(SERVICE_ACCOUNT_ANNOTATION, BUILDER_SERVICE_ACCOUNT)
        .with_data(DOCKERCFG_KEY, blob.to_vec())
}

/// Helper to create a reconciler over mock collaborators
#[cfg(test)]
pub fn create_test_reconciler(
    cluster: &MockClusterClient,
    publisher: &MockImagePublisher,
) -> Reconciler {
    let ca = pki::CertificateAuthority::new("falcon-operator", 1)
        .unwrap_or_else(|e| panic!("test CA: {e}"));
    Reconciler::new(
        Arc::new(cluster.clone()),
        Arc::new(publisher.clone()),
        Arc::new(ca),
    )
}
