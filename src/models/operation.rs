//! Handles and statuses of long-running ARM operations.

use super::Resource;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Create,
    Delete,
}

/// Where the status of a pending operation is observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollTarget {
    /// URL from the `Azure-AsyncOperation` header, answers with `{ "status": ... }`.
    AsyncOperation(String),
    /// URL from the `Location` header, answers 202 until done.
    Location(String),
    /// GET the resource id itself and watch `provisioningState`.
    Resource(String),
    /// Check whether the named resource group still exists; gone means done.
    GroupExists(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum HandleState {
    /// The server finished within the initial request.
    Done(Option<Resource>),
    Pending(PollTarget),
}

/// Result of a `begin_*` call: either finished, or something to poll.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationHandle {
    pub kind: OperationKind,
    /// ARM id of the resource the operation concerns.
    pub resource_id: String,
    pub state: HandleState,
}

impl OperationHandle {
    pub fn done(kind: OperationKind, resource_id: &str, resource: Option<Resource>) -> Self {
        OperationHandle {
            kind,
            resource_id: resource_id.to_string(),
            state: HandleState::Done(resource),
        }
    }

    pub fn pending(kind: OperationKind, resource_id: &str, target: PollTarget) -> Self {
        OperationHandle {
            kind,
            resource_id: resource_id.to_string(),
            state: HandleState::Pending(target),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, HandleState::Pending(_))
    }
}

/// One observation of a pending operation.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationStatus {
    InProgress {
        /// Server `Retry-After` hint.
        retry_after: Option<Duration>,
    },
    Succeeded(Option<Resource>),
    Failed {
        code: String,
        message: String,
    },
}

impl OperationStatus {
    pub fn in_progress() -> Self {
        OperationStatus::InProgress { retry_after: None }
    }
}
