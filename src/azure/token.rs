//! Bearer tokens for ARM requests.

use crate::error::{LifecycleError, Result};
use async_trait::async_trait;
use azure_core::auth::TokenCredential;
use azure_identity::DefaultAzureCredential;
use std::sync::Arc;

/// OAuth scope of the ARM control plane.
pub const ARM_SCOPE: &str = "https://management.azure.com/.default";

/// Supplies the bearer token attached to every ARM call.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn bearer_token(&self) -> Result<String>;
}

/// Tokens from the `azure_identity` credential chain
/// (environment service principal, managed identity, Azure CLI).
pub struct IdentityTokenSource {
    credential: Arc<dyn TokenCredential>,
}

impl IdentityTokenSource {
    /// `DefaultAzureCredential`: uses `AZURE_TENANT_ID`, `AZURE_CLIENT_ID` and
    /// `AZURE_CLIENT_SECRET` when present, then managed identity and `az login`.
    pub fn from_environment() -> Self {
        IdentityTokenSource {
            credential: Arc::new(DefaultAzureCredential::default()),
        }
    }
}

#[async_trait]
impl TokenSource for IdentityTokenSource {
    async fn bearer_token(&self) -> Result<String> {
        let token = self
            .credential
            .get_token(&[ARM_SCOPE])
            .await
            .map_err(|e| LifecycleError::Auth(format!("acquiring token for {ARM_SCOPE}: {e}")))?;
        Ok(token.token.secret().to_string())
    }
}

/// A fixed token, e.g. from `ARM_ACCESS_TOKEN` or `az account get-access-token`.
pub struct StaticTokenSource {
    token: String,
}

impl StaticTokenSource {
    pub fn new(token: &str) -> Self {
        StaticTokenSource {
            token: token.to_string(),
        }
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn bearer_token(&self) -> Result<String> {
        if self.token.is_empty() {
            return Err(LifecycleError::Auth("empty access token".to_string()));
        }
        Ok(self.token.clone())
    }
}
