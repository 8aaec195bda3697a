//! ARM REST backend.
//!
//! Handles bearer-token injection, long-running operation detection from the
//! `Azure-AsyncOperation` / `Location` / `Retry-After` headers, pagination via
//! `nextLink`, and ARM error envelope extraction. No retries.

use super::backend::{resource_group_id, ArmBackend};
use super::json;
use super::token::TokenSource;
use crate::error::{LifecycleError, Result};
use crate::models::{
    ArmErrorEnvelope, ArmList, HandleState, OperationHandle, OperationKind, OperationStatus,
    PollTarget, ProvisioningState, Resource, ResourceGroup, ResourceSpec,
};
use async_trait::async_trait;
use colored::Colorize;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// api-version of the `Microsoft.Resources` endpoints.
pub const RESOURCES_API_VERSION: &str = "2021-04-01";

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Body of an `Azure-AsyncOperation` status URL.
#[derive(Deserialize, Debug)]
struct AsyncOperationBody {
    status: String,
    #[serde(default)]
    error: Option<crate::models::ArmErrorBody>,
}

pub struct RestBackend {
    http: Client,
    endpoint: String,
    subscription_id: String,
    tokens: Arc<dyn TokenSource>,
    /// api-version used to create each resource type, lowercased `namespace/type`.
    api_versions: Mutex<HashMap<String, String>>,
}

impl RestBackend {
    /// # Arguments
    /// * `endpoint` - ARM base URL, e.g. `https://management.azure.com`
    /// * `subscription_id` - Subscription every call is scoped to
    /// * `tokens` - Source of bearer tokens
    pub fn new(endpoint: &str, subscription_id: &str, tokens: Arc<dyn TokenSource>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(RestBackend {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            subscription_id: subscription_id.to_string(),
            tokens,
            api_versions: Mutex::new(HashMap::new()),
        })
    }

    fn group_url(&self, name: &str) -> String {
        format!(
            "{}/subscriptions/{}/resourcegroups/{}?api-version={RESOURCES_API_VERSION}",
            self.endpoint, self.subscription_id, name
        )
    }

    /// Absolute URL for an ARM id or a server-supplied link.
    fn absolute(&self, id_or_url: &str) -> String {
        if id_or_url.starts_with("http://") || id_or_url.starts_with("https://") {
            id_or_url.to_string()
        } else {
            format!("{}{}", self.endpoint, id_or_url)
        }
    }

    fn remember_api_version(&self, spec: &ResourceSpec) {
        let mut versions = self.api_versions.lock().unwrap_or_else(|e| e.into_inner());
        versions.insert(
            spec.resource_type_path().to_lowercase(),
            spec.api_version.clone(),
        );
    }

    fn api_version_for(&self, id: &str) -> String {
        let versions = self.api_versions.lock().unwrap_or_else(|e| e.into_inner());
        resource_type_of(id)
            .and_then(|t| versions.get(&t).cloned())
            .unwrap_or_else(|| RESOURCES_API_VERSION.to_string())
    }

    async fn send(&self, method: Method, url: &str, body: Option<&Value>) -> Result<Response> {
        let token = self.tokens.bearer_token().await?;
        log::debug!("{} {}", method.as_str().on_blue(), url);
        let mut request = self.http.request(method, url).bearer_auth(token);
        if let Some(body) = body {
            log::trace!("body={body}");
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    async fn read_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
        let text = response.text().await?;
        log::trace!("{what} response={text}");
        json::parse(&text, what)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, what: &str) -> Result<T> {
        let response = self.send(Method::GET, url, None).await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Self::read_json(response, what).await
    }

    /// Follow `nextLink` to collect all items of a paginated list.
    async fn get_all_pages<T: DeserializeOwned>(&self, initial_url: &str, what: &str) -> Result<Vec<T>> {
        let mut all = Vec::new();
        let mut url = initial_url.to_string();
        let mut pages = 0;
        loop {
            let page: ArmList<T> = self.get_json(&url, what).await?;
            pages += 1;
            all.extend(page.value);
            match page.next_link {
                Some(next) if !next.is_empty() => {
                    if next == url {
                        return Err(LifecycleError::Transport(format!(
                            "nextLink not unique - possible infinite loop: {next}"
                        )));
                    }
                    url = next;
                }
                _ => break,
            }
        }
        log::debug!("{what}: {} item(s) in {pages} page(s)", all.len());
        Ok(all)
    }

    async fn poll_async_operation(&self, handle: &OperationHandle, url: &str) -> Result<OperationStatus> {
        let response = self.send(Method::GET, url, None).await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        let retry_after = retry_after(response.headers());
        let body: AsyncOperationBody = Self::read_json(response, "async operation status").await?;
        match ProvisioningState::parse(&body.status) {
            ProvisioningState::InProgress(_) => Ok(OperationStatus::InProgress { retry_after }),
            ProvisioningState::Succeeded => self.finished(handle).await,
            state => {
                let error = body.error.unwrap_or_default();
                Ok(OperationStatus::Failed {
                    code: if error.code.is_empty() { state.to_string() } else { error.code },
                    message: error.message,
                })
            }
        }
    }

    async fn poll_location(&self, handle: &OperationHandle, url: &str) -> Result<OperationStatus> {
        let response = self.send(Method::GET, url, None).await?;
        match response.status() {
            StatusCode::ACCEPTED => Ok(OperationStatus::InProgress {
                retry_after: retry_after(response.headers()),
            }),
            status if status.is_success() => {
                let text = response.text().await?;
                match handle.kind {
                    OperationKind::Create if !text.trim().is_empty() => {
                        let resource: Resource = json::parse(&text, "resource")?;
                        Ok(OperationStatus::Succeeded(Some(resource)))
                    }
                    OperationKind::Create => self.finished(handle).await,
                    OperationKind::Delete => Ok(OperationStatus::Succeeded(None)),
                }
            }
            _ => Err(api_error(response).await),
        }
    }

    async fn poll_resource(&self, handle: &OperationHandle, id: &str) -> Result<OperationStatus> {
        let url = format!("{}?api-version={}", self.absolute(id), self.api_version_for(id));
        let response = self.send(Method::GET, &url, None).await?;
        let status = response.status();
        if handle.kind == OperationKind::Delete && status == StatusCode::NOT_FOUND {
            return Ok(OperationStatus::Succeeded(None));
        }
        if !status.is_success() {
            return Err(api_error(response).await);
        }
        let retry_after = retry_after(response.headers());
        let resource: Resource = Self::read_json(response, "resource").await?;
        Ok(match resource.provisioning_state() {
            ProvisioningState::Succeeded if handle.kind == OperationKind::Create => {
                OperationStatus::Succeeded(Some(resource))
            }
            ProvisioningState::Failed | ProvisioningState::Canceled => OperationStatus::Failed {
                code: resource.provisioning_state().to_string(),
                message: format!("{id} reported provisioning state {}", resource.provisioning_state()),
            },
            _ => OperationStatus::InProgress { retry_after },
        })
    }

    /// Terminal success; a create returns the resource as it is now.
    async fn finished(&self, handle: &OperationHandle) -> Result<OperationStatus> {
        match handle.kind {
            OperationKind::Create => Ok(OperationStatus::Succeeded(Some(
                self.get_resource(&handle.resource_id).await?,
            ))),
            OperationKind::Delete => Ok(OperationStatus::Succeeded(None)),
        }
    }
}

#[async_trait]
impl ArmBackend for RestBackend {
    async fn create_or_update_resource_group(
        &self,
        name: &str,
        location: &str,
        tags: &HashMap<String, String>,
    ) -> Result<ResourceGroup> {
        let body = json!({ "location": location, "tags": tags });
        let response = self.send(Method::PUT, &self.group_url(name), Some(&body)).await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Self::read_json(response, "resource group").await
    }

    async fn get_resource_group(&self, name: &str) -> Result<ResourceGroup> {
        self.get_json(&self.group_url(name), "resource group").await
    }

    async fn list_resource_groups(&self) -> Result<Vec<ResourceGroup>> {
        let url = format!(
            "{}/subscriptions/{}/resourcegroups?api-version={RESOURCES_API_VERSION}",
            self.endpoint, self.subscription_id
        );
        self.get_all_pages(&url, "resource group list").await
    }

    async fn begin_create_resource(
        &self,
        group: &str,
        spec: &ResourceSpec,
    ) -> Result<OperationHandle> {
        spec.validate()?;
        self.remember_api_version(spec);
        let id = spec.resource_id(&self.subscription_id, group);
        let url = format!("{}?api-version={}", self.absolute(&id), spec.api_version);

        let response = self.send(Method::PUT, &url, Some(&spec.request_body())).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(api_error(response).await);
        }
        if let Some(target) = lro_target(status, response.headers()) {
            log::info!("create {id} accepted, polling {target:?}");
            return Ok(OperationHandle::pending(OperationKind::Create, &id, target));
        }
        if status == StatusCode::ACCEPTED {
            return Ok(OperationHandle::pending(
                OperationKind::Create,
                &id,
                PollTarget::Resource(id.clone()),
            ));
        }

        let resource: Resource = Self::read_json(response, "resource").await?;
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
        let url = format!("{}?api-version={}", self.absolute(id), self.api_version_for(id));
        self.get_json(&url, "resource").await
    }

    async fn list_resources(&self, group: &str) -> Result<Vec<Resource>> {
        let url = format!(
            "{}/subscriptions/{}/resourceGroups/{}/resources?api-version={RESOURCES_API_VERSION}",
            self.endpoint, self.subscription_id, group
        );
        self.get_all_pages(&url, "resource list").await
    }

    async fn begin_delete_resource_group(&self, name: &str) -> Result<OperationHandle> {
        let id = resource_group_id(&self.subscription_id, name);
        let response = self.send(Method::DELETE, &self.group_url(name), None).await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            log::warn!("resource group {name} already gone");
            return Ok(OperationHandle::done(OperationKind::Delete, &id, None));
        }
        if !status.is_success() {
            return Err(api_error(response).await);
        }
        match lro_target(status, response.headers()) {
            Some(target) => Ok(OperationHandle::pending(OperationKind::Delete, &id, target)),
            None if status == StatusCode::ACCEPTED => Ok(OperationHandle::pending(
                OperationKind::Delete,
                &id,
                PollTarget::GroupExists(name.to_string()),
            )),
            None => Ok(OperationHandle::done(OperationKind::Delete, &id, None)),
        }
    }

    async fn poll(&self, handle: &OperationHandle) -> Result<OperationStatus> {
        match &handle.state {
            HandleState::Done(resource) => Ok(OperationStatus::Succeeded(resource.clone())),
            HandleState::Pending(PollTarget::AsyncOperation(url)) => {
                self.poll_async_operation(handle, url).await
            }
            HandleState::Pending(PollTarget::Location(url)) => self.poll_location(handle, url).await,
            HandleState::Pending(PollTarget::Resource(id)) => self.poll_resource(handle, id).await,
            HandleState::Pending(PollTarget::GroupExists(name)) => {
                let url = self.group_url(name);
                let response = self.send(Method::GET, &url, None).await?;
                match response.status() {
                    StatusCode::NOT_FOUND => Ok(OperationStatus::Succeeded(None)),
                    s if s.is_success() => Ok(OperationStatus::in_progress()),
                    _ => Err(api_error(response).await),
                }
            }
        }
    }
}

/// Where to poll, when the response announces a long-running operation.
fn lro_target(status: StatusCode, headers: &HeaderMap) -> Option<PollTarget> {
    if let Some(url) = header_str(headers, "azure-asyncoperation") {
        return Some(PollTarget::AsyncOperation(url));
    }
    if status == StatusCode::ACCEPTED {
        if let Some(url) = header_str(headers, "location") {
            return Some(PollTarget::Location(url));
        }
    }
    None
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `Retry-After` in delta-seconds form.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    header_str(headers, "retry-after")
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Turn a failed response into [`LifecycleError::Api`].
async fn api_error(response: Response) -> LifecycleError {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    let (code, message) = match serde_json::from_str::<ArmErrorEnvelope>(&text) {
        Ok(envelope) => (envelope.error.code, envelope.error.message),
        Err(_) => (String::new(), text.trim().to_string()),
    };
    log::warn!(
        "{failed} ARM status={status} code={code} message={message}",
        failed = "failed".on_red()
    );
    LifecycleError::Api {
        status,
        code,
        message,
    }
}

/// Lowercased `namespace/type` of an ARM id, from its last `providers` segment.
fn resource_type_of(id: &str) -> Option<String> {
    let segments: Vec<&str> = id.split('/').filter(|s| !s.is_empty()).collect();
    let at = segments
        .iter()
        .rposition(|s| s.eq_ignore_ascii_case("providers"))?;
    let namespace = segments.get(at + 1)?;
    let resource_type = segments.get(at + 2)?;
    Some(format!("{namespace}/{resource_type}").to_lowercase())
}
