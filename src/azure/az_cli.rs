//! Backend that drives the `az` command line.
//!
//! Credentials are whatever `az login` holds. Creates block inside the CLI
//! until ARM finishes, deletes are issued with `--no-wait` and polled.

use super::backend::{resource_group_id, ArmBackend};
use super::cli;
use super::json;
use crate::error::{LifecycleError, Result};
use crate::models::{
    HandleState, OperationHandle, OperationKind, OperationStatus, PollTarget, ProvisioningState,
    Resource, ResourceGroup, ResourceSpec,
};
use async_trait::async_trait;
use std::collections::HashMap;

pub struct AzCliBackend {
    subscription_id: String,
}

impl AzCliBackend {
    pub fn new(subscription_id: &str) -> Self {
        AzCliBackend {
            subscription_id: subscription_id.to_string(),
        }
    }

    /// `az {args} --subscription {id} --output json`
    fn command(&self, args: &str) -> String {
        format!(
            "az {args} --subscription {} --output json",
            self.subscription_id
        )
    }

    async fn az(&self, args: &str) -> Result<String> {
        cli::run_blocking(self.command(args)).await
    }
}

/// `k=v` pairs for `--tags`, sorted so commands are stable.
fn tag_args(tags: &HashMap<String, String>) -> Result<String> {
    let mut pairs = Vec::with_capacity(tags.len());
    for (key, value) in tags {
        if key.contains(['\'', ' ']) || value.contains(['\'', ' ']) {
            return Err(LifecycleError::InvalidSpec(format!(
                "tag {key}={value} contains a quote or space"
            )));
        }
        pairs.push(format!("{key}={value}"));
    }
    pairs.sort();
    Ok(pairs.join(" "))
}

/// A bare command-line value; the command splitter would break it on whitespace.
fn plain_arg<'a>(what: &str, value: &'a str) -> Result<&'a str> {
    if value.is_empty() || value.contains(|c: char| c.is_whitespace() || c == '\'' || c == '"') {
        return Err(LifecycleError::InvalidSpec(format!(
            "{what} '{value}' must be non-empty without spaces or quotes"
        )));
    }
    Ok(value)
}

/// Single-quoted JSON argument; the command splitter cannot escape quotes.
fn quoted_json(value: &serde_json::Value) -> Result<String> {
    let text = value.to_string();
    if text.contains('\'') {
        return Err(LifecycleError::InvalidSpec(
            "resource body must not contain single quotes".to_string(),
        ));
    }
    Ok(format!("'{text}'"))
}

#[async_trait]
impl ArmBackend for AzCliBackend {
    async fn create_or_update_resource_group(
        &self,
        name: &str,
        location: &str,
        tags: &HashMap<String, String>,
    ) -> Result<ResourceGroup> {
        let mut args = format!(
            "group create --name {} --location {}",
            plain_arg("resource group name", name)?,
            plain_arg("location", location)?
        );
        if !tags.is_empty() {
            args.push_str(&format!(" --tags {}", tag_args(tags)?));
        }
        let output = self.az(&args).await?;
        json::parse(&output, "az group create")
    }

    async fn get_resource_group(&self, name: &str) -> Result<ResourceGroup> {
        let name = plain_arg("resource group name", name)?;
        let output = self.az(&format!("group show --name {name}")).await?;
        json::parse(&output, "az group show")
    }

    async fn list_resource_groups(&self) -> Result<Vec<ResourceGroup>> {
        let output = self.az("group list").await?;
        json::parse(&output, "az group list")
    }

    async fn begin_create_resource(
        &self,
        group: &str,
        spec: &ResourceSpec,
    ) -> Result<OperationHandle> {
        spec.validate()?;
        let id = spec.resource_id(&self.subscription_id, group);
        let args = format!(
            "resource create --resource-group {group} --name {name} --resource-type {rtype} --api-version {api} --is-full-object --properties {body}",
            group = plain_arg("resource group name", group)?,
            name = plain_arg("resource name", &spec.name)?,
            rtype = spec.resource_type_path(),
            api = spec.api_version,
            body = quoted_json(&spec.request_body())?,
        );
        let output = self.az(&args).await?;
        let resource: Resource = json::parse(&output, "az resource create")?;
        match resource.provisioning_state() {
            ProvisioningState::Succeeded => Ok(OperationHandle::done(
                OperationKind::Create,
                &id,
                Some(resource),
            )),
            ProvisioningState::InProgress(_) => Ok(OperationHandle::pending(
                OperationKind::Create,
                &id,
                PollTarget::Resource(id.clone()),
            )),
            state => Err(LifecycleError::OperationFailed {
                code: state.to_string(),
                message: format!("{id} reported provisioning state {state}"),
            }),
        }
    }

    async fn get_resource(&self, id: &str) -> Result<Resource> {
        let id = plain_arg("resource id", id)?;
        let output = self.az(&format!("resource show --ids {id}")).await?;
        json::parse(&output, "az resource show")
    }

    async fn list_resources(&self, group: &str) -> Result<Vec<Resource>> {
        let output = self
            .az(&format!(
                "resource list --resource-group {}",
                plain_arg("resource group name", group)?
            ))
            .await?;
        json::parse(&output, "az resource list")
    }

    async fn begin_delete_resource_group(&self, name: &str) -> Result<OperationHandle> {
        let name = plain_arg("resource group name", name)?;
        self.az(&format!("group delete --name {name} --yes --no-wait"))
            .await?;
        Ok(OperationHandle::pending(
            OperationKind::Delete,
            &resource_group_id(&self.subscription_id, name),
            PollTarget::GroupExists(name.to_string()),
        ))
    }

    async fn poll(&self, handle: &OperationHandle) -> Result<OperationStatus> {
        match &handle.state {
            HandleState::Done(resource) => Ok(OperationStatus::Succeeded(resource.clone())),
            HandleState::Pending(PollTarget::GroupExists(name)) => {
                let output = self.az(&format!("group exists --name {name}")).await?;
                match output.trim() {
                    "false" => Ok(OperationStatus::Succeeded(None)),
                    "true" => Ok(OperationStatus::in_progress()),
                    other => Err(LifecycleError::Cli(format!(
                        "unexpected 'az group exists' output: {other}"
                    ))),
                }
            }
            HandleState::Pending(PollTarget::Resource(id)) => {
                let resource = self.get_resource(id).await?;
                Ok(match resource.provisioning_state() {
                    ProvisioningState::Succeeded => OperationStatus::Succeeded(Some(resource)),
                    ProvisioningState::InProgress(_) => OperationStatus::in_progress(),
                    state => OperationStatus::Failed {
                        code: state.to_string(),
                        message: format!("{id} reported provisioning state {state}"),
                    },
                })
            }
            HandleState::Pending(target) => Err(LifecycleError::Cli(format!(
                "az cli backend cannot poll {target:?}"
            ))),
        }
    }
}
