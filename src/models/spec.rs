//! Description of a resource to create.

use crate::error::{LifecycleError, Result};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

pub const NETWORK_API_VERSION: &str = "2023-09-01";
pub const STORAGE_API_VERSION: &str = "2023-01-01";

/// What to create inside a resource group.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSpec {
    /// Provider namespace, e.g. `Microsoft.Network`.
    pub provider_namespace: String,
    /// Type below the namespace, e.g. `virtualNetworks`.
    pub resource_type: String,
    pub name: String,
    pub location: String,
    pub api_version: String,
    pub tags: HashMap<String, String>,
    pub properties: Value,
    pub sku: Option<Value>,
    pub kind: Option<String>,
}

impl ResourceSpec {
    pub fn new(
        provider_namespace: &str,
        resource_type: &str,
        name: &str,
        location: &str,
        api_version: &str,
    ) -> Self {
        ResourceSpec {
            provider_namespace: provider_namespace.to_string(),
            resource_type: resource_type.to_string(),
            name: name.to_string(),
            location: location.to_string(),
            api_version: api_version.to_string(),
            tags: HashMap::new(),
            properties: Value::Object(Map::new()),
            sku: None,
            kind: None,
        }
    }

    /// A virtual network with the given address space.
    pub fn virtual_network(name: &str, location: &str, address_prefixes: Vec<String>) -> Self {
        let mut spec = ResourceSpec::new(
            "Microsoft.Network",
            "virtualNetworks",
            name,
            location,
            NETWORK_API_VERSION,
        );
        spec.properties = json!({
            "addressSpace": { "addressPrefixes": address_prefixes }
        });
        spec
    }

    /// A general purpose v2 storage account.
    pub fn storage_account(name: &str, location: &str, sku_name: &str) -> Self {
        let mut spec = ResourceSpec::new(
            "Microsoft.Storage",
            "storageAccounts",
            name,
            location,
            STORAGE_API_VERSION,
        );
        spec.sku = Some(json!({ "name": sku_name }));
        spec.kind = Some("StorageV2".to_string());
        spec.properties = json!({ "minimumTlsVersion": "TLS1_2" });
        spec
    }

    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_string(), value.to_string());
        self
    }

    /// `{namespace}/{type}`, as used by `az resource --resource-type`.
    pub fn resource_type_path(&self) -> String {
        format!("{}/{}", self.provider_namespace, self.resource_type)
    }

    /// Fully qualified ARM id of this resource once created in `group`.
    pub fn resource_id(&self, subscription_id: &str, group: &str) -> String {
        format!(
            "/subscriptions/{subscription_id}/resourceGroups/{group}/providers/{path}/{name}",
            path = self.resource_type_path(),
            name = self.name
        )
    }

    /// Only the fields ARM requires on every create are checked.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("name", &self.name),
            ("location", &self.location),
            ("provider namespace", &self.provider_namespace),
            ("resource type", &self.resource_type),
            ("api version", &self.api_version),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(LifecycleError::InvalidSpec(format!(
                    "{field} is empty for {}",
                    self.resource_type_path()
                )));
            }
        }
        Ok(())
    }

    /// PUT body for ARM.
    pub fn request_body(&self) -> Value {
        let mut body = json!({
            "location": self.location,
            "properties": self.properties,
        });
        if !self.tags.is_empty() {
            body["tags"] = json!(self.tags);
        }
        if let Some(sku) = &self.sku {
            body["sku"] = sku.clone();
        }
        if let Some(kind) = &self.kind {
            body["kind"] = json!(kind);
        }
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_network_body() {
        let spec = ResourceSpec::virtual_network("vnet1", "westus", vec!["10.1.0.0/16".into()]);
        assert_eq!(spec.resource_type_path(), "Microsoft.Network/virtualNetworks");
        let body = spec.request_body();
        assert_eq!(body["location"], "westus");
        assert_eq!(
            body["properties"]["addressSpace"]["addressPrefixes"][0],
            "10.1.0.0/16"
        );
        assert!(body.get("sku").is_none());
        assert!(body.get("tags").is_none());
    }

    #[test]
    fn test_storage_account_body() {
        let spec = ResourceSpec::storage_account("stacc1", "eastus", "Standard_LRS")
            .with_tag("env", "sample");
        let body = spec.request_body();
        assert_eq!(body["sku"]["name"], "Standard_LRS");
        assert_eq!(body["kind"], "StorageV2");
        assert_eq!(body["tags"]["env"], "sample");
    }

    #[test]
    fn test_resource_id() {
        let spec = ResourceSpec::virtual_network("vnet1", "westus", vec![]);
        assert_eq!(
            spec.resource_id("sub-1", "rg-1"),
            "/subscriptions/sub-1/resourceGroups/rg-1/providers/Microsoft.Network/virtualNetworks/vnet1"
        );
    }

    #[test]
    fn test_validate_rejects_empty_fields() {
        let spec = ResourceSpec::virtual_network("", "westus", vec![]);
        assert!(matches!(spec.validate(), Err(LifecycleError::InvalidSpec(_))));

        let spec = ResourceSpec::virtual_network("vnet1", " ", vec![]);
        assert!(matches!(spec.validate(), Err(LifecycleError::InvalidSpec(_))));

        let spec = ResourceSpec::virtual_network("vnet1", "westus", vec![]);
        assert!(spec.validate().is_ok());
    }
}
