//! Error taxonomy for the resource lifecycle.
//!
//! Every failure is fatal to the workflow: nothing here is retried or
//! recovered locally, callers log and abort.

use std::time::Duration;
use thiserror::Error;

/// Errors raised while provisioning, polling or cleaning up ARM resources.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Missing or malformed environment variable.
    #[error("configuration error: {0}")]
    Config(String),

    /// A resource description is missing a required field.
    #[error("invalid resource spec: {0}")]
    InvalidSpec(String),

    /// The initial remote call of a provisioning step failed.
    #[error("provisioning failed ({operation}): {source}")]
    Provisioning {
        operation: String,
        #[source]
        source: Box<LifecycleError>,
    },

    /// ARM answered with a non-success status.
    #[error("ARM returned {status} {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("authentication error: {0}")]
    Auth(String),

    /// Response body did not match the expected shape.
    #[error("error parsing {what}: path={path} error={message}")]
    Parse {
        what: String,
        path: String,
        message: String,
    },

    #[error("az cli error: {0}")]
    Cli(String),

    /// The long-running operation reached a terminal failure state.
    #[error("operation failed {code}: {message}")]
    OperationFailed { code: String, message: String },

    /// The poll deadline passed before the operation finished.
    #[error("timed out after {polls} poll(s) and {elapsed:?}")]
    Timeout { polls: u32, elapsed: Duration },

    #[error("cleanup of resource group {group} failed: {source}")]
    Cleanup {
        group: String,
        #[source]
        source: Box<LifecycleError>,
    },
}

impl LifecycleError {
    /// Wrap an error raised by the first remote call of `operation`.
    pub fn provisioning(operation: impl Into<String>, source: LifecycleError) -> Self {
        LifecycleError::Provisioning {
            operation: operation.into(),
            source: Box::new(source),
        }
    }

    pub fn cleanup(group: impl Into<String>, source: LifecycleError) -> Self {
        LifecycleError::Cleanup {
            group: group.into(),
            source: Box::new(source),
        }
    }

    /// True for an ARM 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LifecycleError::Api { status: 404, .. })
    }
}

impl From<reqwest::Error> for LifecycleError {
    fn from(e: reqwest::Error) -> Self {
        LifecycleError::Transport(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LifecycleError>;
