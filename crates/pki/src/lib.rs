//! Falcon Operator PKI
//!
//! The operator owns a single certificate authority for its whole lifetime.
//! It is built once at start-up by [`bootstrap`], after the operator's namespace
//! identity has been resolved, and then shared read-only (usually behind an `Arc`)
//! with whatever needs to issue TLS material.
//!
//! # Example
//!
//! ```no_run
//! use pki::{bootstrap, NAMESPACE_FILE};
//!
//! # fn example() -> Result<(), pki::PkiError> {
//! let pki = bootstrap(NAMESPACE_FILE)?;
//! let cert = pki
//!     .ca
//!     .issue_server_certificate("falcon-injector", &["falcon-injector.falcon-system.svc"])?;
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
pub mod ca;
pub mod error;

pub use bootstrap::{
    CA_VALIDITY_DAYS, CaBootstrap, DEFAULT_NAMESPACE, NAMESPACE_FILE, NamespaceIdentity, bootstrap,
    resolve_namespace,
};
pub use ca::{CertificateAuthority, IssuedCertificate};
pub use error::{PkiError, Result};
