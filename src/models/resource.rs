//! ARM resource and resource group representations.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// `properties.provisioningState` of an ARM resource or operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningState {
    Succeeded,
    Failed,
    Canceled,
    /// Any non-terminal state (`Creating`, `Updating`, `Deleting`, `Accepted`, ...).
    InProgress(String),
}

impl ProvisioningState {
    /// Parse a state reported by ARM. Case-insensitive, unknown states are in progress.
    pub fn parse(state: &str) -> Self {
        match state.trim().to_lowercase().as_str() {
            "succeeded" => ProvisioningState::Succeeded,
            "failed" => ProvisioningState::Failed,
            "canceled" | "cancelled" => ProvisioningState::Canceled,
            _ => ProvisioningState::InProgress(state.trim().to_string()),
        }
    }
}

impl fmt::Display for ProvisioningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvisioningState::Succeeded => write!(f, "Succeeded"),
            ProvisioningState::Failed => write!(f, "Failed"),
            ProvisioningState::Canceled => write!(f, "Canceled"),
            ProvisioningState::InProgress(s) => write!(f, "{s}"),
        }
    }
}

/// Read `provisioningState` out of a `properties` object.
/// Resources that do not report one are treated as provisioned.
fn state_of(properties: &Value) -> ProvisioningState {
    properties
        .get("provisioningState")
        .and_then(Value::as_str)
        .map(ProvisioningState::parse)
        .unwrap_or(ProvisioningState::Succeeded)
}

/// An ARM resource group.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ResourceGroup {
    pub id: String,
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub tags: Option<HashMap<String, String>>,
    #[serde(default)]
    pub properties: Value,
}

impl ResourceGroup {
    pub fn provisioning_state(&self) -> ProvisioningState {
        state_of(&self.properties)
    }
}

/// A tracked ARM resource living inside a resource group.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Resource {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub properties: Value,
}

impl Resource {
    pub fn provisioning_state(&self) -> ProvisioningState {
        state_of(&self.properties)
    }
}

/// One page of an ARM list response.
#[derive(Deserialize, Debug)]
pub struct ArmList<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(rename = "nextLink", default)]
    pub next_link: Option<String>,
}

/// Error envelope ARM returns on failure: `{ "error": { "code", "message" } }`.
#[derive(Deserialize, Debug, Default, Clone)]
pub struct ArmErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Deserialize, Debug)]
pub struct ArmErrorEnvelope {
    pub error: ArmErrorBody,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_states() {
        assert_eq!(ProvisioningState::parse("Succeeded"), ProvisioningState::Succeeded);
        assert_eq!(ProvisioningState::parse("FAILED"), ProvisioningState::Failed);
        assert_eq!(ProvisioningState::parse("Canceled"), ProvisioningState::Canceled);
        assert_eq!(
            ProvisioningState::parse("Updating"),
            ProvisioningState::InProgress("Updating".to_string())
        );
    }

    #[test]
    fn test_resource_state_from_properties() {
        let resource: Resource = serde_json::from_value(json!({
            "id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Network/virtualNetworks/vnet1",
            "name": "vnet1",
            "type": "Microsoft.Network/virtualNetworks",
            "location": "westus",
            "properties": { "provisioningState": "Updating" }
        }))
        .expect("Error parsing resource");
        assert_eq!(
            resource.provisioning_state(),
            ProvisioningState::InProgress("Updating".to_string())
        );
    }

    #[test]
    fn test_missing_state_is_succeeded() {
        let group: ResourceGroup = serde_json::from_value(json!({
            "id": "/subscriptions/s/resourceGroups/rg",
            "name": "rg",
            "location": "westus"
        }))
        .expect("Error parsing resource group");
        assert_eq!(group.provisioning_state(), ProvisioningState::Succeeded);
        assert!(group.tags.is_none());
    }
}
