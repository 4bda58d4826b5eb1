//! # Credential Locator
//!
//! Finds the registry push credential OpenShift provisions for the `builder`
//! service account, and writes credential blobs to owner-only files.

use crate::error::ControllerError;
use cluster_client::{ClusterClientTrait, CredentialSecret};
use std::fmt;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Secret type carrying a legacy docker config
pub const DOCKERCFG_SECRET_TYPE: &str = "kubernetes.io/dockercfg";

/// Annotation naming the service account a token/dockercfg secret belongs to
pub const SERVICE_ACCOUNT_ANNOTATION: &str = "kubernetes.io/service-account.name";

/// Service account allowed to push to the namespace's image streams
pub const BUILDER_SERVICE_ACCOUNT: &str = "builder";

/// Data key holding the docker config
pub const DOCKERCFG_KEY: &str = ".dockercfg";

/// Raw `.dockercfg` payload of a qualifying secret
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryCredential(Vec<u8>);

impl RegistryCredential {
    pub fn new(blob: impl Into<Vec<u8>>) -> Self {
        Self(blob.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for RegistryCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RegistryCredential(<{} bytes redacted>)", self.0.len())
    }
}

fn qualifies(secret: &CredentialSecret) -> bool {
    if secret.data.is_empty() {
        debug!("Secret {} skipped: no data", secret.name);
        return false;
    }
    if secret.secret_type.as_deref() != Some(DOCKERCFG_SECRET_TYPE) {
        debug!("Secret {} skipped: type {:?}", secret.name, secret.secret_type);
        return false;
    }
    if secret.annotation(SERVICE_ACCOUNT_ANNOTATION) != Some(BUILDER_SERVICE_ACCOUNT) {
        debug!("Secret {} skipped: not owned by {}", secret.name, BUILDER_SERVICE_ACCOUNT);
        return false;
    }
    if !secret.data.contains_key(DOCKERCFG_KEY) {
        debug!("Secret {} skipped: no {} key", secret.name, DOCKERCFG_KEY);
        return false;
    }
    true
}

/// First secret in enumeration order that carries a builder `.dockercfg`
pub fn select_dockercfg(secrets: &[CredentialSecret]) -> Option<RegistryCredential> {
    secrets
        .iter()
        .find(|s| qualifies(s))
        .and_then(|s| s.data.get(DOCKERCFG_KEY))
        .map(|blob| RegistryCredential::new(blob.clone()))
}

/// Locate the builder `.dockercfg` in `namespace`
///
/// # Errors
/// * `ControllerError::Transport` - the secret list could not be read
/// * `ControllerError::CredentialNotFound` - no secret qualifies
pub async fn locate_dockercfg(
    client: &dyn ClusterClientTrait,
    namespace: &str,
) -> Result<RegistryCredential, ControllerError> {
    let secrets = client
        .list_secrets(namespace)
        .await
        .map_err(ControllerError::Transport)?;

    debug!("Scanning {} secrets in namespace {}", secrets.len(), namespace);
    select_dockercfg(&secrets)
        .ok_or_else(|| ControllerError::CredentialNotFound(namespace.to_string()))
}

/// Write `blob` to `path` with owner-only permissions, replacing any previous content
#[cfg(unix)]
pub fn write_scoped_credential(path: &Path, blob: &[u8]) -> std::io::Result<()> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on creation
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    file.write_all(blob)?;
    file.sync_all()
}

#[cfg(not(unix))]
pub fn write_scoped_credential(path: &Path, blob: &[u8]) -> std::io::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    file.write_all(blob)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::dockercfg_secret;
    use cluster_client::MockClusterClient;

    #[tokio::test]
    async fn test_single_dockercfg_secret_is_returned() {
        let mock = MockClusterClient::new();
        mock.add_secret("ns1", dockercfg_secret("builder-dockercfg-abc", b"XYZ"));

        let credential = locate_dockercfg(&mock, "ns1").await.unwrap();
        assert_eq!(credential.as_bytes(), b"XYZ");
    }

    #[tokio::test]
    async fn test_empty_namespace_is_not_found() {
        let mock = MockClusterClient::new();

        let err = locate_dockercfg(&mock, "ns1").await.unwrap_err();
        assert!(matches!(err, ControllerError::CredentialNotFound(ref ns) if ns == "ns1"));
        assert!(err.to_string().contains("ns1"));
    }

    #[tokio::test]
    async fn test_list_failure_is_transport_error() {
        let mock = MockClusterClient::new();
        mock.fail_list_secrets("connection refused");

        let err = locate_dockercfg(&mock, "ns1").await.unwrap_err();
        assert!(matches!(err, ControllerError::Transport(_)));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_each_predicate_rejects() {
        let no_data = CredentialSecret::new("empty")
            .with_type(DOCKERCFG_SECRET_TYPE)
            .with_annotation(SERVICE_ACCOUNT_ANNOTATION, BUILDER_SERVICE_ACCOUNT);
        let wrong_type = dockercfg_secret("opaque", b"A").with_type("Opaque");
        let wrong_account = dockercfg_secret("deployer", b"B")
            .with_annotation(SERVICE_ACCOUNT_ANNOTATION, "deployer");
        let wrong_key = CredentialSecret::new("dockerconfigjson")
            .with_type(DOCKERCFG_SECRET_TYPE)
            .with_annotation(SERVICE_ACCOUNT_ANNOTATION, BUILDER_SERVICE_ACCOUNT)
            .with_data(".dockerconfigjson", b"C".to_vec());

        for secret in [no_data, wrong_type, wrong_account, wrong_key] {
            assert!(select_dockercfg(&[secret.clone()]).is_none(), "{secret:?} should not qualify");
        }
    }

    #[test]
    fn test_first_qualifying_secret_wins() {
        let secrets = vec![
            CredentialSecret::new("token").with_data("token", b"t".to_vec()),
            dockercfg_secret("first", b"ONE"),
            dockercfg_secret("second", b"TWO"),
        ];

        assert_eq!(select_dockercfg(&secrets).unwrap().as_bytes(), b"ONE");
    }

    #[test]
    fn test_debug_is_redacted() {
        let credential = RegistryCredential::new(b"secret-auth".to_vec());
        let debug = format!("{credential:?}");
        assert!(!debug.contains("secret-auth"));
        assert!(debug.contains("11 bytes"));
    }

    #[test]
    fn test_write_scoped_credential_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".dockercfg");

        write_scoped_credential(&path, b"a much longer first payload").unwrap();
        write_scoped_credential(&path, b"short").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"short");
    }

    #[cfg(unix)]
    #[test]
    fn test_write_scoped_credential_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".dockercfg");
        std::fs::write(&path, b"old").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        write_scoped_credential(&path, b"new").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_write_scoped_credential_propagates_io_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join(".dockercfg");

        assert!(write_scoped_credential(&path, b"x").is_err());
    }
}
