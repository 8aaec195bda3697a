//! Configuration read from environment variables.
//!
//! A `.env` file is honoured by the binaries through `dotenv` before
//! [`LifecycleConfig::from_env`] runs.

use crate::azure::BackendKind;
use crate::error::{LifecycleError, Result};
use crate::processing::{CleanupPolicy, LifecycleOptions, PollOptions};
use std::time::Duration;

pub const DEFAULT_LOCATION: &str = "westus";
pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 600;

/// Settings shared by every step of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleConfig {
    pub subscription_id: String,
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub object_id: Option<String>,
    pub location: String,
    /// Skip deleting the resource group at the end of a run.
    pub keep_resource: bool,
    pub backend: BackendKind,
    pub endpoint: String,
    /// Fixed bearer token, bypasses the credential chain.
    pub access_token: Option<String>,
    pub poll: PollOptions,
    pub cleanup_policy: CleanupPolicy,
}

impl LifecycleConfig {
    /// Read the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let subscription_id = get("AZURE_SUBSCRIPTION_ID").ok_or_else(|| {
            LifecycleError::Config("AZURE_SUBSCRIPTION_ID is not set".to_string())
        })?;

        let backend = match get("ARM_BACKEND") {
            Some(v) => v.parse::<BackendKind>()?,
            None => BackendKind::Rest,
        };

        let cleanup_policy = match get("CLEANUP_POLICY") {
            Some(v) => v.parse::<CleanupPolicy>()?,
            None => CleanupPolicy::BestEffort,
        };

        let interval = secs(&get, "POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?;
        if interval.is_zero() {
            return Err(LifecycleError::Config(
                "POLL_INTERVAL_SECS must be greater than 0".to_string(),
            ));
        }
        let timeout = secs(&get, "POLL_TIMEOUT_SECS", DEFAULT_POLL_TIMEOUT_SECS)?;

        let config = LifecycleConfig {
            subscription_id,
            tenant_id: get("AZURE_TENANT_ID"),
            client_id: get("AZURE_CLIENT_ID"),
            object_id: get("AZURE_OBJECT_ID"),
            location: get("AZURE_LOCATION").unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
            keep_resource: get("KEEP_RESOURCE").map(|v| is_set(&v)).unwrap_or(false),
            backend,
            endpoint: get("ARM_ENDPOINT")
                .map(|e| e.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            access_token: get("ARM_ACCESS_TOKEN"),
            poll: PollOptions::new(interval, timeout),
            cleanup_policy,
        };
        log::debug!(
            "config: subscription={} location={} backend={:?} keep_resource={}",
            config.subscription_id,
            config.location,
            config.backend,
            config.keep_resource
        );
        Ok(config)
    }

    pub fn lifecycle_options(&self) -> LifecycleOptions {
        LifecycleOptions {
            poll: self.poll,
            keep_resource: self.keep_resource,
            cleanup_policy: self.cleanup_policy,
        }
    }
}

fn secs<F>(get: &F, key: &str, default: u64) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(v) => v
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| LifecycleError::Config(format!("{key}={v} is not a number: {e}"))),
        None => Ok(Duration::from_secs(default)),
    }
}

/// A flag is on for any value except `0`, `false` and `no`.
fn is_set(value: &str) -> bool {
    !matches!(value.to_lowercase().as_str(), "0" | "false" | "no")
}
