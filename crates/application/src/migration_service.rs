//! Ordered schema migration ports and application service.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{error, info, warn};

use mantia_core::AppError;
use mantia_domain::MigrationVersion;

/// Default number of attempts when another replica migrates concurrently.
pub const DEFAULT_CONTENDED_ATTEMPTS: u32 = 10;

/// Default pause between contended attempts.
pub const DEFAULT_CONTENDED_PAUSE: Duration = Duration::from_millis(250);

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// A migration unit known to this build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationUnitInfo {
    /// Ordering version.
    pub version: MigrationVersion,
    /// Description taken from the file name.
    pub description: String,
}

impl MigrationUnitInfo {
    /// Returns a stable label such as `002 add user system`.
    #[must_use]
    pub fn identifier(&self) -> String {
        if self.description.is_empty() {
            return self.version.to_string();
        }

        format!("{} {}", self.version, self.description)
    }
}

/// Repository port for applying migration units.
#[async_trait]
pub trait MigrationRepository: Send + Sync {
    /// Lists the units of this build in application order.
    fn units(&self) -> Vec<MigrationUnitInfo>;

    /// Lists versions recorded as applied. An absent ledger means none.
    async fn applied_versions(&self) -> Result<Vec<MigrationVersion>, MigrationFailure>;

    /// Applies every pending unit in version order, each in its own
    /// transaction, stopping at the first failing unit.
    async fn apply_pending(&self) -> Result<(), MigrationFailure>;
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Versions touched by one migrator run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Units applied during this run, in order.
    pub applied: Vec<MigrationVersion>,
    /// Units already present in the ledger.
    pub skipped: Vec<MigrationVersion>,
}

/// Migrator failure. Later units are never attempted after one of these.
#[derive(Debug, Error)]
pub enum MigrationFailure {
    /// The ledger could not be created or read.
    #[error("failed to prepare migration ledger: {0}")]
    Ledger(#[source] AppError),

    /// A unit failed and was rolled back.
    #[error("migration unit {identifier} failed: {cause}")]
    Unit {
        /// Version of the failed unit.
        version: MigrationVersion,
        /// Label of the failed unit.
        identifier: String,
        /// Underlying error.
        #[source]
        cause: AppError,
    },

    /// Another session created the same objects or ledger rows first.
    /// The failed transaction was rolled back and may be retried.
    #[error("migration raced with a concurrent bootstrap: {0}")]
    Contended(#[source] AppError),
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Applies the repository's units strictly in version order.
#[derive(Clone)]
pub struct MigrationService {
    repository: Arc<dyn MigrationRepository>,
    contended_attempts: u32,
    contended_pause: Duration,
}

impl MigrationService {
    /// Creates a migration service.
    #[must_use]
    pub fn new(repository: Arc<dyn MigrationRepository>) -> Self {
        Self {
            repository,
            contended_attempts: DEFAULT_CONTENDED_ATTEMPTS,
            contended_pause: DEFAULT_CONTENDED_PAUSE,
        }
    }

    /// Overrides how often a run that raced another replica is retried.
    #[must_use]
    pub fn with_contention_policy(mut self, attempts: u32, pause: Duration) -> Self {
        self.contended_attempts = attempts.max(1);
        self.contended_pause = pause;
        self
    }

    /// Applies every unit not yet in the ledger.
    ///
    /// Stops at the first failing unit. Re-running a fully applied set
    /// changes nothing. A run that lost a race against a concurrent
    /// bootstrap re-reads the ledger and continues from there.
    pub async fn apply(&self) -> Result<MigrationReport, MigrationFailure> {
        let mut attempt = 1;
        loop {
            match self.apply_once().await {
                Err(MigrationFailure::Contended(cause)) if attempt < self.contended_attempts => {
                    warn!(
                        attempt,
                        error = %cause,
                        "concurrent migration detected, re-reading ledger"
                    );
                    attempt += 1;
                    tokio::time::sleep(self.contended_pause).await;
                }
                Err(failure) => {
                    error!(error = %failure, "database migrations failed");
                    return Err(failure);
                }
                Ok(report) => return Ok(report),
            }
        }
    }

    async fn apply_once(&self) -> Result<MigrationReport, MigrationFailure> {
        let units = self.repository.units();
        let before = self.repository.applied_versions().await?;

        for version in &before {
            if !units.iter().any(|unit| unit.version == *version) {
                warn!(%version, "ledger contains a migration unit unknown to this build");
            }
        }

        let pending = units
            .iter()
            .filter(|unit| !before.contains(&unit.version))
            .count();
        if pending > 0 {
            info!(pending, "applying migration units");
            self.repository.apply_pending().await?;
        }

        let after = if pending > 0 {
            self.repository.applied_versions().await?
        } else {
            before.clone()
        };

        let mut report = MigrationReport::default();
        for unit in &units {
            if before.contains(&unit.version) {
                report.skipped.push(unit.version);
            } else if after.contains(&unit.version) {
                info!(version = %unit.version, unit = %unit.identifier(), "migration unit applied");
                report.applied.push(unit.version);
            }
        }

        info!(
            applied = report.applied.len(),
            skipped = report.skipped.len(),
            "database migrations complete"
        );

        Ok(report)
    }
}
