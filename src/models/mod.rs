//! Domain models for the resource lifecycle.
//!
//! This module contains the data structures exchanged with ARM:
//! - [`ResourceGroup`] and [`Resource`] - remote entities as ARM reports them
//! - [`ResourceSpec`] - what to create
//! - [`OperationHandle`] and [`OperationStatus`] - long-running operations

mod operation;
mod resource;
mod spec;

// Re-export public types
pub use operation::{HandleState, OperationHandle, OperationKind, OperationStatus, PollTarget};
pub use resource::{
    ArmErrorBody, ArmErrorEnvelope, ArmList, ProvisioningState, Resource, ResourceGroup,
};
pub use spec::{ResourceSpec, NETWORK_API_VERSION, STORAGE_API_VERSION};
