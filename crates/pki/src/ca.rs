//! Self-signed certificate authority

use crate::error::{PkiError, Result};
use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, DnValue,
    ExtendedKeyUsagePurpose, IsCa, Issuer, KeyPair, KeyUsagePurpose, SanType, string::Ia5String,
};
use std::fmt;
use time::{Duration, OffsetDateTime};

/// Certificate Authority owned by the operator process
///
/// Immutable once built; share it behind an `Arc`.
pub struct CertificateAuthority {
    namespace: String,
    validity_days: u32,
    not_before: OffsetDateTime,
    not_after: OffsetDateTime,
    /// CA key pair as PEM (KeyPair isn't Clone, so it is re-parsed per signature)
    ca_key_pem: String,
    ca_cert_pem: String,
}

/// A leaf certificate and its private key, both PEM encoded
#[derive(Clone)]
pub struct IssuedCertificate {
    /// Certificate signed by the CA
    pub cert_pem: String,
    /// Private key of the certificate
    pub key_pem: String,
}

impl fmt::Debug for IssuedCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedCertificate")
            .field("cert_pem", &self.cert_pem)
            .field("key_pem", &"<redacted>")
            .finish()
    }
}

fn subject(common_name: &str, namespace: &str) -> DistinguishedName {
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, DnValue::Utf8String(common_name.to_string()));
    dn.push(DnType::OrganizationName, DnValue::Utf8String("CrowdStrike".to_string()));
    dn.push(
        DnType::OrganizationalUnitName,
        DnValue::Utf8String(namespace.to_string()),
    );
    dn
}

impl CertificateAuthority {
    /// Create a new self-signed CA for `namespace`, valid for `validity_days` from now
    pub fn new(namespace: &str, validity_days: u32) -> Result<Self> {
        let not_before = OffsetDateTime::now_utc();
        let not_after = not_before + Duration::days(i64::from(validity_days));

        let mut params = CertificateParams::default();
        params.distinguished_name = subject("Falcon Operator CA", namespace);
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];
        params.not_before = not_before;
        params.not_after = not_after;

        let key_pair = KeyPair::generate().map_err(|e| {
            PkiError::KeyGeneration(format!("failed to generate CA key: {e}"))
        })?;

        let cert = params.self_signed(&key_pair).map_err(|e| {
            PkiError::CertificateGeneration(format!("failed to create CA cert: {e}"))
        })?;

        Ok(Self {
            namespace: namespace.to_string(),
            validity_days,
            not_before,
            not_after,
            ca_key_pem: key_pair.serialize_pem(),
            ca_cert_pem: cert.pem(),
        })
    }

    /// Namespace identity the CA was created for
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Validity window length in days
    pub fn validity_days(&self) -> u32 {
        self.validity_days
    }

    /// Start of the CA validity window
    pub fn not_before(&self) -> OffsetDateTime {
        self.not_before
    }

    /// End of the CA validity window
    pub fn not_after(&self) -> OffsetDateTime {
        self.not_after
    }

    /// CA certificate in PEM format (for trust bundles)
    pub fn ca_cert_pem(&self) -> &str {
        &self.ca_cert_pem
    }

    fn load_key_pair(&self) -> Result<KeyPair> {
        KeyPair::from_pem(&self.ca_key_pem)
            .map_err(|e| PkiError::Parse(format!("failed to load CA key: {e}")))
    }

    /// Issue a TLS server certificate signed by this CA
    ///
    /// The leaf key is generated locally and returned with the certificate.
    /// The leaf gets the same validity length as the CA, starting now.
    pub fn issue_server_certificate(
        &self,
        common_name: &str,
        dns_names: &[&str],
    ) -> Result<IssuedCertificate> {
        let mut params = CertificateParams::default();
        params.distinguished_name = subject(common_name, &self.namespace);
        params.is_ca = IsCa::NoCa;
        params.key_usages = vec![
            KeyUsagePurpose::DigitalSignature,
            KeyUsagePurpose::KeyEncipherment,
        ];
        params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];

        let not_before = OffsetDateTime::now_utc();
        params.not_before = not_before;
        params.not_after = not_before + Duration::days(i64::from(self.validity_days));

        params.subject_alt_names = dns_names
            .iter()
            .map(|name| {
                Ia5String::try_from(*name)
                    .map(SanType::DnsName)
                    .map_err(|e| PkiError::InvalidDnsName(format!("{name}: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        let leaf_key = KeyPair::generate().map_err(|e| {
            PkiError::KeyGeneration(format!("failed to generate leaf key: {e}"))
        })?;

        let ca_key = self.load_key_pair()?;
        let issuer = Issuer::from_ca_cert_pem(&self.ca_cert_pem, &ca_key)
            .map_err(|e| PkiError::Parse(format!("failed to create issuer: {e}")))?;

        let cert = params.signed_by(&leaf_key, &issuer).map_err(|e| {
            PkiError::CertificateGeneration(format!("failed to sign certificate: {e}"))
        })?;

        Ok(IssuedCertificate {
            cert_pem: cert.pem(),
            key_pem: leaf_key.serialize_pem(),
        })
    }
}

impl fmt::Debug for CertificateAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateAuthority")
            .field("namespace", &self.namespace)
            .field("validity_days", &self.validity_days)
            .field("not_before", &self.not_before)
            .field("not_after", &self.not_after)
            .finish_non_exhaustive()
    }
}
