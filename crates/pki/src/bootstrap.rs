//! Process-wide CA bootstrap
//!
//! Order matters: the namespace identity is resolved first, then the CA is built
//! from it. Identity resolution cannot fail; a missing or unreadable identity file
//! silently keeps [`DEFAULT_NAMESPACE`], and the cause is kept on
//! [`NamespaceIdentity::fallback`] so callers can still log or assert on it.

use crate::ca::CertificateAuthority;
use crate::error::Result;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Namespace used when the identity file cannot be read
pub const DEFAULT_NAMESPACE: &str = "falcon-operator";

/// CA validity window in days
pub const CA_VALIDITY_DAYS: u32 = 3650;

/// Service-account namespace file mounted into every pod
pub const NAMESPACE_FILE: &str = "/var/run/secrets/kubernetes.io/serviceaccount/namespace";

/// Resolved namespace identity of the operator process
#[derive(Debug)]
pub struct NamespaceIdentity {
    /// Namespace in effect
    pub namespace: String,
    /// Why the default was used, if it was
    pub fallback: Option<io::Error>,
}

impl NamespaceIdentity {
    /// Whether the default namespace is in effect
    pub fn is_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    fn default_because(cause: io::Error) -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            fallback: Some(cause),
        }
    }
}

/// Read the namespace identity from `path`, trimming surrounding whitespace
pub fn resolve_namespace(path: impl AsRef<Path>) -> NamespaceIdentity {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let namespace = contents.trim();
            if namespace.is_empty() {
                return NamespaceIdentity::default_because(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("{} is empty", path.display()),
                ));
            }
            NamespaceIdentity {
                namespace: namespace.to_string(),
                fallback: None,
            }
        }
        Err(e) => NamespaceIdentity::default_because(e),
    }
}

/// The operator's CA together with the identity it was built from
#[derive(Debug)]
pub struct CaBootstrap {
    /// Identity used to build the CA
    pub identity: NamespaceIdentity,
    /// The CA itself
    pub ca: Arc<CertificateAuthority>,
}

/// Resolve the namespace identity from `namespace_file`, then build the CA
///
/// Only the crypto backend can make this fail; a bad identity file never does.
pub fn bootstrap(namespace_file: impl AsRef<Path>) -> Result<CaBootstrap> {
    let identity = resolve_namespace(namespace_file);
    if let Some(cause) = &identity.fallback {
        warn!(
            "Namespace identity unavailable ({}), using default namespace {}",
            cause, identity.namespace
        );
    }

    let ca = CertificateAuthority::new(&identity.namespace, CA_VALIDITY_DAYS)?;
    info!(
        "Certificate authority created for namespace {} (valid {} days)",
        ca.namespace(),
        ca.validity_days()
    );

    Ok(CaBootstrap {
        identity,
        ca: Arc::new(ca),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let identity = resolve_namespace(dir.path().join("namespace"));

        assert_eq!(identity.namespace, DEFAULT_NAMESPACE);
        let cause = identity.fallback.as_ref().unwrap();
        assert_eq!(cause.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_namespace_is_trimmed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"  team-ns\n").unwrap();

        let identity = resolve_namespace(file.path());
        assert_eq!(identity.namespace, "team-ns");
        assert!(!identity.is_fallback());
    }

    #[test]
    fn test_blank_file_falls_back_to_default() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b" \n\t").unwrap();

        let identity = resolve_namespace(file.path());
        assert_eq!(identity.namespace, DEFAULT_NAMESPACE);
        assert_eq!(
            identity.fallback.as_ref().map(io::Error::kind),
            Some(io::ErrorKind::InvalidData)
        );
    }

    #[test]
    fn test_bootstrap_uses_resolved_identity() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"  team-ns\n").unwrap();

        let pki = bootstrap(file.path()).unwrap();
        assert_eq!(pki.ca.namespace(), "team-ns");
        assert_eq!(pki.ca.validity_days(), CA_VALIDITY_DAYS);
    }

    #[test]
    fn test_bootstrap_succeeds_without_identity_file() {
        let dir = tempfile::tempdir().unwrap();

        let pki = bootstrap(dir.path().join("missing")).unwrap();
        assert!(pki.identity.is_fallback());
        assert_eq!(pki.ca.namespace(), DEFAULT_NAMESPACE);
    }
}
