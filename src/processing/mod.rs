//! Resource lifecycle processing logic.
//!
//! This module contains the workflow built on top of an [`crate::azure::ArmBackend`]:
//! - [`clock`] - Pluggable time source
//! - [`poller`] - Long-running operation polling
//! - [`lifecycle`] - Ensure group, create, await, clean up
//! - [`sweep`] - Bulk deletion for the cleanup utility

mod clock;
mod lifecycle;
mod poller;
mod sweep;

// Re-export public types and functions
pub use clock::{Clock, ManualClock, SystemClock};
pub use lifecycle::{
    CleanupOutcome, CleanupPolicy, Completed, Lifecycle, LifecycleOptions, LifecycleReport,
    CREATED_AT_TAG, CREATED_BY_TAG, CREATED_BY_VALUE,
};
pub use poller::{PollOptions, PollOutcome, PollState, Poller};
pub use sweep::{select_groups, sweep, SweepSummary};
