//! PostgreSQL migration repository backed by the sqlx migrator.

use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::migrate::{MigrateError, Migrator};
use tracing::debug;

use mantia_application::{MigrationFailure, MigrationRepository, MigrationUnitInfo};
use mantia_core::{AppError, AppResult};
use mantia_domain::MigrationVersion;

/// SQLSTATE codes raised when a concurrent session created the same object,
/// ledger row or catalog entry first.
const CONTENDED_SQLSTATES: &[&str] = &["23505", "42P07", "42710", "40P01"];

/// PostgreSQL implementation of the migration repository port.
///
/// Units run through [`Migrator`] with advisory locking disabled, so
/// concurrent replicas rely on idempotent statements and unique keys.
/// Ledger versions unknown to this build are tolerated.
pub struct PostgresMigrationRepository {
    pool: PgPool,
    migrator: Migrator,
}

impl PostgresMigrationRepository {
    /// Creates a repository for the units compiled into this build.
    #[must_use]
    pub fn embedded(pool: PgPool) -> Self {
        Self::with_migrator(pool, sqlx::migrate!("./migrations"))
    }

    /// Creates a repository for the `<version>_<description>.sql` files of
    /// a directory. Files with other names are ignored.
    pub async fn from_directory(pool: PgPool, directory: &Path) -> AppResult<Self> {
        let migrator = Migrator::new(directory).await.map_err(|error| {
            AppError::Validation(format!(
                "failed to load migrations from '{}': {error}",
                directory.display()
            ))
        })?;

        let mut versions = HashSet::new();
        for migration in migrator.iter() {
            if !versions.insert(migration.version) {
                return Err(AppError::Validation(format!(
                    "migration version {} is declared twice in '{}'",
                    migration.version,
                    directory.display()
                )));
            }
        }

        debug!(
            directory = %directory.display(),
            units = versions.len(),
            "discovered migration files"
        );
        Ok(Self::with_migrator(pool, migrator))
    }

    fn with_migrator(pool: PgPool, mut migrator: Migrator) -> Self {
        migrator.set_locking(false);
        migrator.set_ignore_missing(true);
        Self { pool, migrator }
    }

    fn identifier(&self, version: i64) -> String {
        self.migrator
            .iter()
            .find(|migration| migration.version == version)
            .map(|migration| format!("{version:03} {}", migration.description))
            .unwrap_or_else(|| format!("{version:03}"))
    }

    fn unit_failure(&self, version: i64, cause: AppError) -> MigrationFailure {
        match MigrationVersion::new(version) {
            Ok(checked) => MigrationFailure::Unit {
                version: checked,
                identifier: self.identifier(version),
                cause,
            },
            Err(error) => MigrationFailure::Ledger(error),
        }
    }

    fn map_migrate_error(&self, error: MigrateError) -> MigrationFailure {
        match error {
            MigrateError::ExecuteMigration(source, _) | MigrateError::Execute(source)
                if is_contended(&source) =>
            {
                MigrationFailure::Contended(AppError::Internal(source.to_string()))
            }
            MigrateError::ExecuteMigration(source, version) => {
                self.unit_failure(version, AppError::Internal(source.to_string()))
            }
            MigrateError::VersionMismatch(version) => self.unit_failure(
                version,
                AppError::Conflict(format!(
                    "migration unit {} was modified after it was applied",
                    self.identifier(version)
                )),
            ),
            MigrateError::Dirty(version) => self.unit_failure(
                version,
                AppError::Internal("unit is recorded as partially applied".to_owned()),
            ),
            other => MigrationFailure::Ledger(AppError::Internal(other.to_string())),
        }
    }
}

fn is_contended(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(database_error) => database_error.code().is_some_and(|code| {
            CONTENDED_SQLSTATES
                .iter()
                .any(|contended| *contended == code)
        }),
        _ => false,
    }
}

#[async_trait]
impl MigrationRepository for PostgresMigrationRepository {
    fn units(&self) -> Vec<MigrationUnitInfo> {
        self.migrator
            .iter()
            .filter_map(|migration| {
                MigrationVersion::new(migration.version)
                    .ok()
                    .map(|version| MigrationUnitInfo {
                        version,
                        description: migration.description.to_string(),
                    })
            })
            .collect()
    }

    async fn applied_versions(&self) -> Result<Vec<MigrationVersion>, MigrationFailure> {
        // Reading never creates the ledger; the migrator does that on apply.
        let ledger_exists =
            sqlx::query_scalar::<_, bool>("SELECT to_regclass('_sqlx_migrations') IS NOT NULL")
                .fetch_one(&self.pool)
                .await
                .map_err(|error| {
                    MigrationFailure::Ledger(AppError::Internal(format!(
                        "failed to look up migration ledger: {error}"
                    )))
                })?;
        if !ledger_exists {
            return Ok(Vec::new());
        }

        let versions = sqlx::query_scalar::<_, i64>(
            "SELECT version FROM _sqlx_migrations WHERE success ORDER BY version",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            MigrationFailure::Ledger(AppError::Internal(format!(
                "failed to read migration ledger: {error}"
            )))
        })?;

        versions
            .into_iter()
            .map(|version| MigrationVersion::new(version).map_err(MigrationFailure::Ledger))
            .collect()
    }

    async fn apply_pending(&self) -> Result<(), MigrationFailure> {
        let mut connection = self.pool.acquire().await.map_err(|error| {
            MigrationFailure::Ledger(AppError::Internal(format!(
                "failed to acquire migration connection: {error}"
            )))
        })?;

        // `Migrator::run` over a pool is not provably `Send` behind async-trait.
        self.migrator
            .run_direct(&mut *connection)
            .await
            .map_err(|error| self.map_migrate_error(error))
    }
}
