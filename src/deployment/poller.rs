use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::teamcity_client::{ProjectRef, TeamCityClient};
use crate::types::DeployError;

/// Source of fresh project snapshots. Never cached between calls.
#[async_trait]
pub trait InventorySource: Send + Sync {
    async fn fetch_projects(&self) -> Result<Vec<ProjectRef>, DeployError>;
}

#[async_trait]
impl InventorySource for TeamCityClient {
    async fn fetch_projects(&self) -> Result<Vec<ProjectRef>, DeployError> {
        self.list_projects().await
    }
}

#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by tokio's timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            interval: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Polling,
    Converged,
    TimedOut,
}

#[derive(Debug, Clone)]
pub struct PollOutcome {
    pub state: PollState,
    pub polls: u32,
    pub elapsed: Duration,
    /// Most recent successful snapshot; empty if every poll failed.
    pub inventory: Vec<ProjectRef>,
    pub last_error: Option<String>,
}

impl PollOutcome {
    pub fn converged(&self) -> bool {
        self.state == PollState::Converged
    }
}

/// Fixed-interval polling until the marker project shows up.
///
/// A poll is only started while the elapsed time is below the timeout, so a
/// marker that never appears costs exactly `ceil(timeout / interval)` polls.
pub struct ConvergencePoller<'a> {
    source: &'a dyn InventorySource,
    clock: &'a dyn Clock,
    policy: PollPolicy,
    marker_id: &'a str,
}

impl<'a> ConvergencePoller<'a> {
    pub fn new(
        source: &'a dyn InventorySource,
        clock: &'a dyn Clock,
        policy: PollPolicy,
        marker_id: &'a str,
    ) -> Self {
        Self {
            source,
            clock,
            policy,
            marker_id,
        }
    }

    pub async fn run(&self) -> PollOutcome {
        let start = self.clock.now();
        let mut state = PollState::Polling;
        let mut polls = 0u32;
        let mut inventory = Vec::new();
        let mut last_error = None;

        while state == PollState::Polling {
            let elapsed = self.clock.now().saturating_duration_since(start);
            if elapsed >= self.policy.timeout {
                state = PollState::TimedOut;
                continue;
            }

            polls += 1;
            match self.source.fetch_projects().await {
                Ok(projects) => {
                    let found = projects.iter().any(|p| p.id == self.marker_id);
                    inventory = projects;
                    if found {
                        info!(
                            marker = %self.marker_id,
                            polls,
                            "Marker project found, synchronization successful"
                        );
                        state = PollState::Converged;
                        continue;
                    }
                }
                Err(err) => {
                    warn!(error = ?err, polls, "Failed to list projects while polling");
                    last_error = Some(err.to_string());
                }
            }

            let elapsed = self.clock.now().saturating_duration_since(start);
            if elapsed + self.policy.interval >= self.policy.timeout {
                state = PollState::TimedOut;
                continue;
            }
            info!(
                polls,
                elapsed_secs = elapsed.as_secs(),
                wait_secs = self.policy.interval.as_secs(),
                "Still synchronizing"
            );
            self.clock.sleep(self.policy.interval).await;
        }

        let elapsed = self.clock.now().saturating_duration_since(start);
        if state == PollState::TimedOut {
            warn!(
                marker = %self.marker_id,
                polls,
                timeout_secs = self.policy.timeout.as_secs(),
                "Timed out waiting for synchronization"
            );
        }
        PollOutcome {
            state,
            polls,
            elapsed,
            inventory,
            last_error,
        }
    }
}
