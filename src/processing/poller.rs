//! Polling a long-running operation to a terminal state.
//!
//! The loop is an explicit state machine:
//! `Pending -> { Succeeded, Failed, TimedOut }`.
//! The deadline is checked after each sleep, so no poll is issued once the
//! timeout has elapsed. A timeout does not cancel the remote operation.

use super::clock::Clock;
use crate::azure::ArmBackend;
use crate::error::{LifecycleError, Result};
use crate::models::{HandleState, OperationHandle, OperationStatus, Resource};
use colored::Colorize;
use std::time::Duration;

/// How often and how long to poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollOptions {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        PollOptions { interval, timeout }
    }
}

impl Default for PollOptions {
    fn default() -> Self {
        PollOptions::new(Duration::from_secs(5), Duration::from_secs(600))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    Pending {
        polls: u32,
        elapsed: Duration,
    },
    Succeeded {
        polls: u32,
        elapsed: Duration,
        resource: Option<Resource>,
    },
    Failed {
        polls: u32,
        code: String,
        message: String,
    },
    TimedOut {
        polls: u32,
        elapsed: Duration,
    },
}

/// A successfully finished operation.
#[derive(Debug, Clone, PartialEq)]
pub struct PollOutcome {
    /// Body of the finished resource, when the backend returned one.
    pub resource: Option<Resource>,
    pub polls: u32,
    pub elapsed: Duration,
}

pub struct Poller<'a> {
    backend: &'a dyn ArmBackend,
    clock: &'a dyn Clock,
    options: PollOptions,
}

impl<'a> Poller<'a> {
    pub fn new(backend: &'a dyn ArmBackend, clock: &'a dyn Clock, options: PollOptions) -> Self {
        Poller {
            backend,
            clock,
            options,
        }
    }

    /// Drive `handle` until it succeeds, fails or times out.
    ///
    /// A handle that completed synchronously returns at once without polling.
    /// Backend errors while polling are returned unchanged.
    pub async fn poll_until_done(&self, handle: &OperationHandle) -> Result<PollOutcome> {
        if let HandleState::Done(resource) = &handle.state {
            log::debug!("{} completed synchronously", handle.resource_id);
            return Ok(PollOutcome {
                resource: resource.clone(),
                polls: 0,
                elapsed: Duration::ZERO,
            });
        }

        let start = self.clock.now();
        let mut state = PollState::Pending {
            polls: 0,
            elapsed: Duration::ZERO,
        };
        loop {
            state = match state {
                PollState::Pending { polls, .. } => self.step(handle, polls, start).await?,
                PollState::Succeeded {
                    polls,
                    elapsed,
                    resource,
                } => {
                    log::info!(
                        "{} {} after {polls} poll(s) in {elapsed:?}",
                        handle.resource_id,
                        "Succeeded".green()
                    );
                    return Ok(PollOutcome {
                        resource,
                        polls,
                        elapsed,
                    });
                }
                PollState::Failed {
                    polls,
                    code,
                    message,
                } => {
                    log::error!(
                        "{} {} after {polls} poll(s): {code} {message}",
                        handle.resource_id,
                        "Failed".on_red()
                    );
                    return Err(LifecycleError::OperationFailed { code, message });
                }
                PollState::TimedOut { polls, elapsed } => {
                    log::error!(
                        "{} {} after {polls} poll(s) in {elapsed:?}",
                        handle.resource_id,
                        "TimedOut".on_red()
                    );
                    return Err(LifecycleError::Timeout { polls, elapsed });
                }
            };
        }
    }

    /// One poll, plus the wait that follows it while still pending.
    async fn step(&self, handle: &OperationHandle, polls: u32, start: Duration) -> Result<PollState> {
        let status = self.backend.poll(handle).await?;
        let polls = polls + 1;
        let elapsed = self.clock.now().saturating_sub(start);

        match status {
            OperationStatus::Succeeded(resource) => Ok(PollState::Succeeded {
                polls,
                elapsed,
                resource,
            }),
            OperationStatus::Failed { code, message } => Ok(PollState::Failed {
                polls,
                code,
                message,
            }),
            OperationStatus::InProgress { retry_after } => {
                let remaining = self.options.timeout.saturating_sub(elapsed);
                let wait = retry_after
                    .filter(|d| !d.is_zero())
                    .unwrap_or(self.options.interval)
                    .min(remaining);
                log::debug!(
                    "{} in progress (poll #{polls}), next check in {wait:?}",
                    handle.resource_id
                );
                self.clock.sleep(wait).await;

                let elapsed = self.clock.now().saturating_sub(start);
                if elapsed >= self.options.timeout {
                    Ok(PollState::TimedOut { polls, elapsed })
                } else {
                    Ok(PollState::Pending { polls, elapsed })
                }
            }
        }
    }
}
