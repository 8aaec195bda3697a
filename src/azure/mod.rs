//! Azure Resource Manager interaction.
//!
//! This module handles all Azure-related operations:
//! - [`backend`] - The [`ArmBackend`] trait the lifecycle drives
//! - [`rest`] - ARM REST over `reqwest`
//! - [`az_cli`] - The same calls through the Azure CLI
//! - [`cli`] - Command execution for Azure CLI
//! - [`token`] - Bearer tokens from `azure_identity`

mod az_cli;
mod backend;
mod cli;
mod json;
mod rest;
mod token;

use crate::config::LifecycleConfig;
use crate::error::Result;
use std::sync::Arc;

// Re-export public types and functions
pub use az_cli::AzCliBackend;
pub use backend::{resource_group_id, ArmBackend, BackendKind};
pub use rest::{RestBackend, RESOURCES_API_VERSION};
pub use token::{IdentityTokenSource, StaticTokenSource, TokenSource, ARM_SCOPE};

/// Build the backend selected by `config.backend`.
///
/// The REST backend takes `ARM_ACCESS_TOKEN` when set, otherwise the
/// `azure_identity` credential chain.
pub fn build_backend(config: &LifecycleConfig) -> Result<Arc<dyn ArmBackend>> {
    match config.backend {
        BackendKind::Rest => {
            let tokens: Arc<dyn TokenSource> = match &config.access_token {
                Some(token) => Arc::new(StaticTokenSource::new(token)),
                None => {
                    log::info!(
                        "Using azure_identity credential chain tenant={} client={}",
                        config.tenant_id.as_deref().unwrap_or("-"),
                        config.client_id.as_deref().unwrap_or("-")
                    );
                    Arc::new(IdentityTokenSource::from_environment())
                }
            };
            log::info!("Using ARM REST backend at {}", config.endpoint);
            Ok(Arc::new(RestBackend::new(
                &config.endpoint,
                &config.subscription_id,
                tokens,
            )?))
        }
        BackendKind::AzCli => {
            log::info!("Using az cli backend");
            Ok(Arc::new(AzCliBackend::new(&config.subscription_id)))
        }
    }
}
