//! The seam between the lifecycle and whatever talks to ARM.

use crate::error::{LifecycleError, Result};
use crate::models::{OperationHandle, OperationStatus, Resource, ResourceGroup, ResourceSpec};
use async_trait::async_trait;
use std::collections::HashMap;
use std::str::FromStr;

/// Control-plane calls the lifecycle needs.
///
/// `begin_*` calls return as soon as ARM accepts the request; the handle is
/// then driven to completion with [`ArmBackend::poll`].
#[async_trait]
pub trait ArmBackend: Send + Sync {
    async fn create_or_update_resource_group(
        &self,
        name: &str,
        location: &str,
        tags: &HashMap<String, String>,
    ) -> Result<ResourceGroup>;

    async fn get_resource_group(&self, name: &str) -> Result<ResourceGroup>;

    async fn list_resource_groups(&self) -> Result<Vec<ResourceGroup>>;

    async fn begin_create_resource(
        &self,
        group: &str,
        spec: &ResourceSpec,
    ) -> Result<OperationHandle>;

    async fn get_resource(&self, id: &str) -> Result<Resource>;

    async fn list_resources(&self, group: &str) -> Result<Vec<Resource>>;

    async fn begin_delete_resource_group(&self, name: &str) -> Result<OperationHandle>;

    /// Observe a handle once.
    async fn poll(&self, handle: &OperationHandle) -> Result<OperationStatus>;
}

/// Which [`ArmBackend`] to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// ARM REST over HTTPS.
    Rest,
    /// The `az` command line.
    AzCli,
}

impl FromStr for BackendKind {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "rest" => Ok(BackendKind::Rest),
            "az-cli" | "azcli" | "cli" => Ok(BackendKind::AzCli),
            other => Err(LifecycleError::Config(format!(
                "unknown ARM_BACKEND '{other}', expected rest or az-cli"
            ))),
        }
    }
}

/// ARM id of a resource group.
pub fn resource_group_id(subscription_id: &str, name: &str) -> String {
    format!("/subscriptions/{subscription_id}/resourceGroups/{name}")
}
