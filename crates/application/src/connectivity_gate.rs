//! Startup gate that waits for the database to accept connections.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use mantia_core::{AppError, AppResult};

/// Default number of probe attempts before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;

/// Default pause between failed probe attempts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(3);

/// Port for a lightweight connect-and-close database check.
#[async_trait]
pub trait DatabaseProbe: Send + Sync {
    /// Opens a connection, runs a trivial query, and closes it again.
    async fn probe(&self) -> AppResult<()>;

    /// Describes the probed target for log lines. Must not include credentials.
    fn target(&self) -> String;
}

/// Retry budget for the connectivity gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatePolicy {
    max_attempts: u32,
    interval: Duration,
}

impl GatePolicy {
    /// Creates a retry policy. At least one attempt is required.
    pub fn new(max_attempts: u32, interval: Duration) -> AppResult<Self> {
        if max_attempts == 0 {
            return Err(AppError::Validation(
                "database wait must allow at least one attempt".to_owned(),
            ));
        }

        Ok(Self {
            max_attempts,
            interval,
        })
    }

    /// Returns the maximum number of probe attempts.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the pause between failed attempts.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_RETRY_INTERVAL,
        }
    }
}

/// Result of waiting for the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// A probe succeeded on the given 1-based attempt.
    Ready {
        /// Attempt that succeeded.
        attempt: u32,
    },
    /// Every attempt failed.
    Unavailable {
        /// Number of attempts made.
        attempts: u32,
        /// Failure reason of the final attempt.
        last_error: String,
    },
}

impl GateOutcome {
    /// Returns whether the database became reachable.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

/// Blocks bootstrap until the database is reachable or the budget runs out.
#[derive(Clone)]
pub struct ConnectivityGate {
    probe: Arc<dyn DatabaseProbe>,
    policy: GatePolicy,
}

impl ConnectivityGate {
    /// Creates a gate over the given probe.
    #[must_use]
    pub fn new(probe: Arc<dyn DatabaseProbe>, policy: GatePolicy) -> Self {
        Self { probe, policy }
    }

    /// Probes until success or until `max_attempts` probes have failed.
    ///
    /// Sleeps `interval` between failures only. Dropping the returned future
    /// stops the loop.
    pub async fn wait_for_database(&self) -> GateOutcome {
        let max_attempts = self.policy.max_attempts();
        let target = self.probe.target();
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            match self.probe.probe().await {
                Ok(()) => {
                    info!(attempt, max_attempts, %target, "database connection established");
                    return GateOutcome::Ready { attempt };
                }
                Err(error) => {
                    warn!(
                        attempt,
                        max_attempts,
                        %target,
                        error = %error,
                        "database not ready"
                    );
                    last_error = error.to_string();
                }
            }

            if attempt < max_attempts {
                tokio::time::sleep(self.policy.interval()).await;
            }
        }

        GateOutcome::Unavailable {
            attempts: max_attempts,
            last_error,
        }
    }
}
