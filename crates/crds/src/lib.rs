//! Falcon Operator CRD Definitions
//!
//! Kubernetes Custom Resource Definitions reconciled by the Falcon Operator.

pub mod falcon_config;

pub use falcon_config::*;
