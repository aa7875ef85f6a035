use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use mantia_application::{
    AdministratorProvisioning, DatabaseProbe, GatePolicy, IdentityRepository, IdentitySummary,
    MigrationFailure, MigrationRepository, MigrationUnitInfo, PasswordHasher, UserRecord,
};
use mantia_core::{AppError, AppResult};
use mantia_domain::{IdentitySeed, MigrationVersion, RoleId, UserId};

use super::{BootstrapPlan, BootstrapPorts, run_bootstrap};
use crate::bootstrap_config::BootstrapMode;
use crate::bootstrap_error::BootstrapFailure;

type Journal = Arc<Mutex<Vec<&'static str>>>;

struct ScriptedProbe {
    journal: Journal,
    reachable: bool,
}

#[async_trait]
impl DatabaseProbe for ScriptedProbe {
    async fn probe(&self) -> AppResult<()> {
        self.journal.lock().await.push("connect");
        if self.reachable {
            return Ok(());
        }

        Err(AppError::Internal("connection refused".to_owned()))
    }

    fn target(&self) -> String {
        "db:5432/mantia".to_owned()
    }
}

struct ScriptedMigrations {
    journal: Journal,
    failing: bool,
}

#[async_trait]
impl MigrationRepository for ScriptedMigrations {
    fn units(&self) -> Vec<MigrationUnitInfo> {
        vec![MigrationUnitInfo {
            version: MigrationVersion::new(1).unwrap_or_else(|_| unreachable!()),
            description: "add storage locations".to_owned(),
        }]
    }

    async fn applied_versions(&self) -> Result<Vec<MigrationVersion>, MigrationFailure> {
        self.journal.lock().await.push("read ledger");
        Ok(Vec::new())
    }

    async fn apply_pending(&self) -> Result<(), MigrationFailure> {
        self.journal.lock().await.push("apply units");
        if self.failing {
            return Err(MigrationFailure::Unit {
                version: MigrationVersion::new(1).unwrap_or_else(|_| unreachable!()),
                identifier: "001 add storage locations".to_owned(),
                cause: AppError::Internal("syntax error".to_owned()),
            });
        }

        Ok(())
    }
}

struct ScriptedIdentity {
    journal: Journal,
}

#[async_trait]
impl IdentityRepository for ScriptedIdentity {
    async fn ensure_reference_data(&self, _seed: &IdentitySeed) -> AppResult<RoleId> {
        self.journal.lock().await.push("reference data");
        Ok(RoleId::new(1))
    }

    async fn find_user_by_username(&self, _username: &str) -> AppResult<Option<UserRecord>> {
        self.journal.lock().await.push("find administrator");
        Ok(None)
    }

    async fn provision_administrator(
        &self,
        _seed: &IdentitySeed,
        role_id: RoleId,
        _password_hash: &str,
    ) -> AppResult<AdministratorProvisioning> {
        self.journal.lock().await.push("create administrator");
        Ok(AdministratorProvisioning::Created {
            user_id: UserId::new(1),
            role_id,
        })
    }

    async fn summarize(&self) -> AppResult<IdentitySummary> {
        Ok(IdentitySummary::default())
    }
}

struct LengthHasher;

impl PasswordHasher for LengthHasher {
    fn hash_password(&self, password: &str) -> AppResult<String> {
        Ok(format!("hashed:{}", password.len()))
    }

    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        Ok(hash == format!("hashed:{}", password.len()))
    }
}

struct Scenario {
    reachable: bool,
    failing_migration: bool,
    mode: BootstrapMode,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            reachable: true,
            failing_migration: false,
            mode: BootstrapMode::Full,
        }
    }
}

async fn run(scenario: Scenario) -> (Result<(), BootstrapFailure>, Vec<&'static str>) {
    let journal = Journal::default();
    let ports = BootstrapPorts {
        probe: Arc::new(ScriptedProbe {
            journal: journal.clone(),
            reachable: scenario.reachable,
        }),
        migrations: Arc::new(ScriptedMigrations {
            journal: journal.clone(),
            failing: scenario.failing_migration,
        }),
        identity: Arc::new(ScriptedIdentity {
            journal: journal.clone(),
        }),
        password_hasher: Arc::new(LengthHasher),
    };
    let plan = BootstrapPlan {
        mode: scenario.mode,
        gate_policy: GatePolicy::new(3, Duration::ZERO).unwrap_or_default(),
        seed: IdentitySeed::reserved(),
    };

    let outcome = run_bootstrap(plan, ports).await;
    let steps = journal.lock().await.clone();
    (outcome, steps)
}

#[tokio::test]
async fn steps_run_gate_then_migrations_then_seeding() {
    let (outcome, steps) = run(Scenario::default()).await;

    assert!(outcome.is_ok());
    assert_eq!(
        steps,
        vec![
            "connect",
            "read ledger",
            "apply units",
            "read ledger",
            "reference data",
            "find administrator",
            "create administrator",
        ]
    );
}

#[tokio::test]
async fn unreachable_database_attempts_no_migration_unit() {
    let (outcome, steps) = run(Scenario {
        reachable: false,
        ..Scenario::default()
    })
    .await;

    let Err(failure) = outcome else {
        panic!("an unreachable database must fail the run");
    };
    assert_eq!(failure.exit_code(), 3);
    assert!(matches!(
        failure,
        BootstrapFailure::DatabaseUnavailable { attempts: 3, .. }
    ));
    assert_eq!(steps, vec!["connect", "connect", "connect"]);
}

#[tokio::test]
async fn migration_failure_skips_seeding() {
    let (outcome, steps) = run(Scenario {
        failing_migration: true,
        ..Scenario::default()
    })
    .await;

    let Err(failure) = outcome else {
        panic!("a failing unit must fail the run");
    };
    assert_eq!(failure.exit_code(), 4);
    assert_eq!(steps, vec!["connect", "read ledger", "apply units"]);
}

#[tokio::test]
async fn migrate_only_mode_never_seeds() {
    let (outcome, steps) = run(Scenario {
        mode: BootstrapMode::MigrateOnly,
        ..Scenario::default()
    })
    .await;

    assert!(outcome.is_ok());
    assert!(!steps.contains(&"reference data"));
    assert!(!steps.contains(&"create administrator"));
}
