//! PKI errors

use thiserror::Error;

/// Errors raised while generating or using the certificate authority
#[derive(Debug, Error)]
pub enum PkiError {
    /// Key generation failed
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// Certificate generation or signing failed
    #[error("certificate generation failed: {0}")]
    CertificateGeneration(String),

    /// A subject alternative name is not a valid DNS name
    #[error("invalid DNS name {0}")]
    InvalidDnsName(String),

    /// Stored CA material could not be parsed back
    #[error("certificate parsing error: {0}")]
    Parse(String),
}

/// Result type for PKI operations
pub type Result<T> = std::result::Result<T, PkiError>;
