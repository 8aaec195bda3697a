//! The resource-lifecycle workflow.
//!
//! Ensure a resource group exists, create a resource inside it, poll the
//! creation to completion, then delete the group unless asked to keep it.
//! Every remote error aborts the run: no retry, no rollback.

use super::clock::Clock;
use super::poller::{PollOptions, Poller};
use crate::azure::ArmBackend;
use crate::error::{LifecycleError, Result};
use crate::models::{OperationHandle, Resource, ResourceGroup, ResourceSpec};
use colored::Colorize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Tag written on every resource group this crate creates.
pub const CREATED_BY_TAG: &str = "created-by";
pub const CREATED_BY_VALUE: &str = "azure-resource-lifecycle";
pub const CREATED_AT_TAG: &str = "created-at";

/// What a failed cleanup does to the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupPolicy {
    /// Log it and report [`CleanupOutcome::Failed`]; the run still succeeds.
    BestEffort,
    /// Fail the run with [`LifecycleError::Cleanup`].
    Fatal,
}

impl FromStr for CleanupPolicy {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "best-effort" | "besteffort" => Ok(CleanupPolicy::BestEffort),
            "fatal" => Ok(CleanupPolicy::Fatal),
            other => Err(LifecycleError::Config(format!(
                "unknown CLEANUP_POLICY '{other}', expected best-effort or fatal"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LifecycleOptions {
    pub poll: PollOptions,
    pub keep_resource: bool,
    pub cleanup_policy: CleanupPolicy,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        LifecycleOptions {
            poll: PollOptions::default(),
            keep_resource: false,
            cleanup_policy: CleanupPolicy::BestEffort,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CleanupOutcome {
    /// `KEEP_RESOURCE` was set.
    Skipped,
    Deleted,
    Failed(String),
}

impl fmt::Display for CleanupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanupOutcome::Skipped => write!(f, "skipped (KEEP_RESOURCE)"),
            CleanupOutcome::Deleted => write!(f, "deleted"),
            CleanupOutcome::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// A resource that finished provisioning.
#[derive(Debug, Clone, PartialEq)]
pub struct Completed {
    pub resource: Resource,
    pub polls: u32,
    pub elapsed: Duration,
}

/// What [`Lifecycle::run`] did.
#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleReport {
    pub group: ResourceGroup,
    pub resource: Resource,
    pub polls: u32,
    pub cleanup: CleanupOutcome,
}

pub struct Lifecycle {
    backend: Arc<dyn ArmBackend>,
    clock: Arc<dyn Clock>,
    options: LifecycleOptions,
}

impl Lifecycle {
    pub fn new(backend: Arc<dyn ArmBackend>, clock: Arc<dyn Clock>, options: LifecycleOptions) -> Self {
        Lifecycle {
            backend,
            clock,
            options,
        }
    }

    /// Idempotent create-or-update of the resource group.
    ///
    /// # Returns
    /// * `Ok(ResourceGroup)` - The group as ARM reports it
    /// * `Err(LifecycleError::Provisioning)` - If the remote call failed
    pub async fn ensure_resource_group(&self, name: &str, location: &str) -> Result<ResourceGroup> {
        if name.trim().is_empty() || location.trim().is_empty() {
            return Err(LifecycleError::InvalidSpec(
                "resource group name and location are required".to_string(),
            ));
        }
        let tags = HashMap::from([
            (CREATED_BY_TAG.to_string(), CREATED_BY_VALUE.to_string()),
            (CREATED_AT_TAG.to_string(), chrono::Utc::now().to_rfc3339()),
        ]);
        let group = self
            .backend
            .create_or_update_resource_group(name, location, &tags)
            .await
            .map_err(|e| LifecycleError::provisioning(format!("create resource group {name}"), e))?;
        log::info!("resource group: {}", group.id.on_blue());
        Ok(group)
    }

    /// Start creating `spec` inside `parent`.
    ///
    /// An error on this first call is returned as `Provisioning` and nothing is polled.
    pub async fn create_tracked_resource(
        &self,
        parent: &ResourceGroup,
        spec: &ResourceSpec,
    ) -> Result<OperationHandle> {
        spec.validate()?;
        let handle = self
            .backend
            .begin_create_resource(&parent.name, spec)
            .await
            .map_err(|e| {
                LifecycleError::provisioning(
                    format!("create {} {}", spec.resource_type_path(), spec.name),
                    e,
                )
            })?;
        log::info!(
            "create {} {}: {}",
            spec.resource_type_path(),
            spec.name,
            if handle.is_pending() { "pending" } else { "completed" }
        );
        Ok(handle)
    }

    /// Poll `handle` every `poll_interval` until it finishes or `timeout` elapses.
    pub async fn await_completion(
        &self,
        handle: &OperationHandle,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<Completed> {
        let poller = Poller::new(
            self.backend.as_ref(),
            self.clock.as_ref(),
            PollOptions::new(poll_interval, timeout),
        );
        let outcome = poller.poll_until_done(handle).await?;
        let resource = match outcome.resource {
            Some(resource) => resource,
            None => self.backend.get_resource(&handle.resource_id).await?,
        };
        Ok(Completed {
            resource,
            polls: outcome.polls,
            elapsed: outcome.elapsed,
        })
    }

    /// Delete the resource group and poll the deletion to completion.
    ///
    /// Never retried. The caller decides whether an error here is fatal.
    pub async fn cleanup(&self, parent: &ResourceGroup) -> Result<()> {
        log::info!("deleting resource group {}", parent.name.on_red());
        let result = async {
            let handle = self.backend.begin_delete_resource_group(&parent.name).await?;
            Poller::new(self.backend.as_ref(), self.clock.as_ref(), self.options.poll)
                .poll_until_done(&handle)
                .await
        }
        .await;

        match result {
            Ok(outcome) => {
                log::info!(
                    "resource group {} deleted after {} poll(s)",
                    parent.name,
                    outcome.polls
                );
                Ok(())
            }
            Err(e) => {
                log::warn!("cleanup of {} failed: {e}", parent.name);
                Err(LifecycleError::cleanup(&parent.name, e))
            }
        }
    }

    pub async fn get_resource(&self, id: &str) -> Result<Resource> {
        self.backend.get_resource(id).await
    }

    pub async fn list_resources(&self, group: &str) -> Result<Vec<Resource>> {
        self.backend.list_resources(group).await
    }

    pub async fn list_resource_groups(&self) -> Result<Vec<ResourceGroup>> {
        self.backend.list_resource_groups().await
    }

    /// The whole workflow for one resource.
    ///
    /// Cleanup only runs after every earlier step succeeded, and only when
    /// `keep_resource` is off.
    pub async fn run(&self, group: &str, location: &str, spec: &ResourceSpec) -> Result<LifecycleReport> {
        log::info!("#Start run() group={group} location={location}");
        let group = self.ensure_resource_group(group, location).await?;
        let handle = self.create_tracked_resource(&group, spec).await?;
        let completed = self
            .await_completion(&handle, self.options.poll.interval, self.options.poll.timeout)
            .await?;
        log::info!(
            "resource: {} state={}",
            completed.resource.id.on_blue(),
            completed.resource.provisioning_state()
        );

        let resources = self.list_resources(&group.name).await?;
        log::info!("{} resource(s) in {}", resources.len(), group.name);

        let cleanup = if self.options.keep_resource {
            log::info!("KEEP_RESOURCE set, leaving {} in place", group.name);
            CleanupOutcome::Skipped
        } else {
            match self.cleanup(&group).await {
                Ok(()) => CleanupOutcome::Deleted,
                Err(e) if self.options.cleanup_policy == CleanupPolicy::BestEffort => {
                    CleanupOutcome::Failed(e.to_string())
                }
                Err(e) => return Err(e),
            }
        };

        Ok(LifecycleReport {
            group,
            resource: completed.resource,
            polls: completed.polls,
            cleanup,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_policy_parse() {
        assert_eq!(
            "best-effort".parse::<CleanupPolicy>().expect("policy"),
            CleanupPolicy::BestEffort
        );
        assert_eq!("Fatal".parse::<CleanupPolicy>().expect("policy"), CleanupPolicy::Fatal);
        assert!("sometimes".parse::<CleanupPolicy>().is_err());
    }

    #[test]
    fn test_cleanup_outcome_display() {
        assert_eq!(CleanupOutcome::Deleted.to_string(), "deleted");
        assert_eq!(
            CleanupOutcome::Failed("boom".to_string()).to_string(),
            "failed: boom"
        );
    }
}
