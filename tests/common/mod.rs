//! Scripted in-memory backend shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use azure_resource_lifecycle::azure::{resource_group_id, ArmBackend};
use azure_resource_lifecycle::models::{
    OperationHandle, OperationKind, OperationStatus, PollTarget, Resource, ResourceGroup,
    ResourceSpec,
};
use azure_resource_lifecycle::{LifecycleError, Result};
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

pub const SUBSCRIPTION: &str = "00000000-0000-0000-0000-000000000001";

#[derive(Default)]
struct Calls {
    create_group: u32,
    create_resource: u32,
    create_polls: u32,
    delete_polls: u32,
    deletes: u32,
    last_tags: HashMap<String, String>,
}

/// Backend whose answers are set up front.
pub struct ScriptedBackend {
    pub fail_create_group: bool,
    pub fail_create_resource: bool,
    pub fail_delete: bool,
    /// Creation finishes inside the first request.
    pub synchronous_create: bool,
    /// Poll answers for the create operation; afterwards `create_fallback` repeats.
    create_script: Mutex<VecDeque<OperationStatus>>,
    create_fallback: OperationStatus,
    calls: Mutex<Calls>,
}

impl ScriptedBackend {
    /// Create succeeds after `pending` in-progress polls.
    pub fn succeeding_after(pending: usize) -> Self {
        let mut script: VecDeque<OperationStatus> =
            (0..pending).map(|_| OperationStatus::in_progress()).collect();
        script.push_back(OperationStatus::Succeeded(Some(vnet("rg-1", "vnet-1"))));
        ScriptedBackend {
            fail_create_group: false,
            fail_create_resource: false,
            fail_delete: false,
            synchronous_create: false,
            create_script: Mutex::new(script),
            create_fallback: OperationStatus::Succeeded(Some(vnet("rg-1", "vnet-1"))),
            calls: Mutex::new(Calls::default()),
        }
    }

    /// Create never leaves the in-progress state.
    pub fn never_finishing() -> Self {
        let mut backend = Self::succeeding_after(0);
        backend.create_script = Mutex::new(VecDeque::new());
        backend.create_fallback = OperationStatus::in_progress();
        backend
    }

    pub fn create_group_calls(&self) -> u32 {
        self.calls.lock().unwrap().create_group
    }

    pub fn create_resource_calls(&self) -> u32 {
        self.calls.lock().unwrap().create_resource
    }

    /// Polls of create operations.
    pub fn polls(&self) -> u32 {
        self.calls.lock().unwrap().create_polls
    }

    pub fn delete_polls(&self) -> u32 {
        self.calls.lock().unwrap().delete_polls
    }

    pub fn deletes(&self) -> u32 {
        self.calls.lock().unwrap().deletes
    }

    pub fn last_tags(&self) -> HashMap<String, String> {
        self.calls.lock().unwrap().last_tags.clone()
    }
}

pub fn group(name: &str) -> ResourceGroup {
    ResourceGroup {
        id: resource_group_id(SUBSCRIPTION, name),
        name: name.to_string(),
        location: "westus".to_string(),
        tags: None,
        properties: json!({ "provisioningState": "Succeeded" }),
    }
}

pub fn vnet(group: &str, name: &str) -> Resource {
    Resource {
        id: format!(
            "/subscriptions/{SUBSCRIPTION}/resourceGroups/{group}/providers/Microsoft.Network/virtualNetworks/{name}"
        ),
        name: name.to_string(),
        resource_type: "Microsoft.Network/virtualNetworks".to_string(),
        location: Some("westus".to_string()),
        properties: json!({ "provisioningState": "Succeeded" }),
    }
}

fn conflict() -> LifecycleError {
    LifecycleError::Api {
        status: 409,
        code: "Conflict".to_string(),
        message: "scripted failure".to_string(),
    }
}

#[async_trait]
impl ArmBackend for ScriptedBackend {
    async fn create_or_update_resource_group(
        &self,
        name: &str,
        _location: &str,
        tags: &HashMap<String, String>,
    ) -> Result<ResourceGroup> {
        let mut calls = self.calls.lock().unwrap();
        calls.create_group += 1;
        calls.last_tags = tags.clone();
        if self.fail_create_group {
            return Err(conflict());
        }
        Ok(group(name))
    }

    async fn get_resource_group(&self, name: &str) -> Result<ResourceGroup> {
        Ok(group(name))
    }

    async fn list_resource_groups(&self) -> Result<Vec<ResourceGroup>> {
        Ok(vec![group("sample-a"), group("keep-me"), group("sample-b")])
    }

    async fn begin_create_resource(
        &self,
        group: &str,
        spec: &ResourceSpec,
    ) -> Result<OperationHandle> {
        self.calls.lock().unwrap().create_resource += 1;
        if self.fail_create_resource {
            return Err(conflict());
        }
        let id = spec.resource_id(SUBSCRIPTION, group);
        if self.synchronous_create {
            return Ok(OperationHandle::done(
                OperationKind::Create,
                &id,
                Some(vnet(group, &spec.name)),
            ));
        }
        Ok(OperationHandle::pending(
            OperationKind::Create,
            &id,
            PollTarget::AsyncOperation("https://scripted/operations/1".to_string()),
        ))
    }

    async fn get_resource(&self, id: &str) -> Result<Resource> {
        let mut resource = vnet("rg-1", "vnet-1");
        resource.id = id.to_string();
        Ok(resource)
    }

    async fn list_resources(&self, group: &str) -> Result<Vec<Resource>> {
        Ok(vec![vnet(group, "vnet-1")])
    }

    async fn begin_delete_resource_group(&self, name: &str) -> Result<OperationHandle> {
        self.calls.lock().unwrap().deletes += 1;
        if self.fail_delete {
            return Err(conflict());
        }
        Ok(OperationHandle::pending(
            OperationKind::Delete,
            &resource_group_id(SUBSCRIPTION, name),
            PollTarget::Location("https://scripted/operations/delete".to_string()),
        ))
    }

    async fn poll(&self, handle: &OperationHandle) -> Result<OperationStatus> {
        match handle.kind {
            OperationKind::Delete => {
                self.calls.lock().unwrap().delete_polls += 1;
                Ok(OperationStatus::Succeeded(None))
            }
            OperationKind::Create => {
                self.calls.lock().unwrap().create_polls += 1;
                let next = self.create_script.lock().unwrap().pop_front();
                Ok(next.unwrap_or_else(|| self.create_fallback.clone()))
            }
        }
    }
}
