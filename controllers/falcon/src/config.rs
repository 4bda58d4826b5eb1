//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use crate::error::ControllerError;
use std::path::PathBuf;

/// Upper bound for `BACKOFF_MAX_MINUTES` (one week)
pub const MAX_BACKOFF_MINUTES: u64 = 7 * 24 * 60;

/// Controller-level configuration
///
/// Every setting has a default and can be overridden via environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Namespace to watch (`WATCH_NAMESPACE`); the operator's own namespace when unset
    pub watch_namespace: Option<String>,
    /// Namespace identity file read at start-up (`NAMESPACE_FILE`)
    pub namespace_file: PathBuf,
    /// skopeo binary used to copy the image (`SKOPEO_PATH`)
    pub skopeo_path: PathBuf,
    /// Falcon API base URL overriding the region default (`FALCON_API_URL`)
    pub falcon_api_url: Option<String>,
    /// Verify TLS when pushing to the image stream registry (`DEST_TLS_VERIFY`)
    pub dest_tls_verify: bool,
    /// Maximum concurrent reconciliations across resources (`RECONCILE_CONCURRENCY`)
    pub concurrency: u16,
    /// Minimum error requeue backoff in minutes (`BACKOFF_MIN_MINUTES`)
    pub backoff_min_minutes: u64,
    /// Maximum error requeue backoff in minutes (`BACKOFF_MAX_MINUTES`)
    pub backoff_max_minutes: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            watch_namespace: None,
            namespace_file: PathBuf::from(pki::NAMESPACE_FILE),
            skopeo_path: PathBuf::from("skopeo"),
            falcon_api_url: None,
            dest_tls_verify: false,
            concurrency: 2,
            backoff_min_minutes: 1,
            backoff_max_minutes: 10,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ControllerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            watch_namespace: lookup("WATCH_NAMESPACE").filter(|ns| !ns.trim().is_empty()),
            namespace_file: lookup("NAMESPACE_FILE")
                .map_or(defaults.namespace_file, PathBuf::from),
            skopeo_path: lookup("SKOPEO_PATH").map_or(defaults.skopeo_path, PathBuf::from),
            falcon_api_url: lookup("FALCON_API_URL").filter(|url| !url.trim().is_empty()),
            dest_tls_verify: parse_or(&lookup, "DEST_TLS_VERIFY", defaults.dest_tls_verify)?,
            concurrency: parse_or(&lookup, "RECONCILE_CONCURRENCY", defaults.concurrency)?,
            backoff_min_minutes: parse_or(
                &lookup,
                "BACKOFF_MIN_MINUTES",
                defaults.backoff_min_minutes,
            )?,
            backoff_max_minutes: parse_or(
                &lookup,
                "BACKOFF_MAX_MINUTES",
                defaults.backoff_max_minutes,
            )?,
        };

        if config.concurrency == 0 {
            return Err(ControllerError::InvalidConfig(
                "RECONCILE_CONCURRENCY must be at least 1".to_string(),
            ));
        }
        if config.backoff_max_minutes > MAX_BACKOFF_MINUTES {
            return Err(ControllerError::InvalidConfig(format!(
                "BACKOFF_MAX_MINUTES ({}) must not exceed {}",
                config.backoff_max_minutes, MAX_BACKOFF_MINUTES
            )));
        }
        if config.backoff_min_minutes == 0
            || config.backoff_min_minutes > config.backoff_max_minutes
        {
            return Err(ControllerError::InvalidConfig(format!(
                "BACKOFF_MIN_MINUTES ({}) must be between 1 and BACKOFF_MAX_MINUTES ({})",
                config.backoff_min_minutes, config.backoff_max_minutes
            )));
        }

        Ok(config)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ControllerError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e| {
            ControllerError::InvalidConfig(format!("{key}={raw:?} is invalid: {e}"))
        }),
    }
}
