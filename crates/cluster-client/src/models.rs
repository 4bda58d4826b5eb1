//! Cluster object projections
//!
//! Only the fields the reconcilers read are carried over from the API types.

use k8s_openapi::api::core::v1::Secret;
use std::collections::BTreeMap;
use std::fmt;

/// A secret as seen by the credential lookup
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CredentialSecret {
    /// Secret name
    pub name: String,
    /// Secret type tag (`type` field), if set
    pub secret_type: Option<String>,
    /// Object annotations
    pub annotations: BTreeMap<String, String>,
    /// Decoded data map
    pub data: BTreeMap<String, Vec<u8>>,
}

impl CredentialSecret {
    /// Creates an empty secret with the given name (for test setup and builders)
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets the type tag
    #[must_use]
    pub fn with_type(mut self, secret_type: impl Into<String>) -> Self {
        self.secret_type = Some(secret_type.into());
        self
    }

    /// Adds an annotation
    #[must_use]
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Adds a data entry
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Annotation value for `key`
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }
}

// Data values are credentials; keep them out of logs.
impl fmt::Debug for CredentialSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSecret")
            .field("name", &self.name)
            .field("secret_type", &self.secret_type)
            .field("annotations", &self.annotations)
            .field("data_keys", &self.data.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl From<Secret> for CredentialSecret {
    fn from(secret: Secret) -> Self {
        Self {
            name: secret.metadata.name.unwrap_or_default(),
            secret_type: secret.type_,
            annotations: secret.metadata.annotations.unwrap_or_default(),
            data: secret
                .data
                .unwrap_or_default()
                .into_iter()
                .map(|(key, value)| (key, value.0))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::ByteString;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    #[test]
    fn test_from_secret_copies_selection_fields() {
        let secret = Secret {
            metadata: ObjectMeta {
                name: Some("builder-dockercfg-x7k2p".to_string()),
                annotations: Some(BTreeMap::from([(
                    "kubernetes.io/service-account.name".to_string(),
                    "builder".to_string(),
                )])),
                ..Default::default()
            },
            type_: Some("kubernetes.io/dockercfg".to_string()),
            data: Some(BTreeMap::from([(
                ".dockercfg".to_string(),
                ByteString(b"XYZ".to_vec()),
            )])),
            ..Default::default()
        };

        let projected = CredentialSecret::from(secret);
        assert_eq!(projected.name, "builder-dockercfg-x7k2p");
        assert_eq!(projected.secret_type.as_deref(), Some("kubernetes.io/dockercfg"));
        assert_eq!(projected.annotation("kubernetes.io/service-account.name"), Some("builder"));
        assert_eq!(projected.data.get(".dockercfg").map(Vec::as_slice), Some(&b"XYZ"[..]));
    }

    #[test]
    fn test_from_secret_without_optional_fields() {
        let projected = CredentialSecret::from(Secret::default());
        assert!(projected.secret_type.is_none());
        assert!(projected.annotations.is_empty());
        assert!(projected.data.is_empty());
    }

    #[test]
    fn test_debug_hides_data_values() {
        let secret = CredentialSecret::new("s").with_data(".dockercfg", b"top-secret".to_vec());
        let rendered = format!("{secret:?}");
        assert!(rendered.contains(".dockercfg"));
        assert!(!rendered.contains("top-secret"));
    }
}
