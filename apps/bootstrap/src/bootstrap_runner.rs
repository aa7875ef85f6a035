//! Gate, migrate and seed, in that order, over injected ports.

use std::sync::Arc;

use mantia_application::{
    BootstrapSeeder, ConnectivityGate, DatabaseProbe, GateOutcome, GatePolicy,
    IdentityRepository, MigrationRepository, MigrationService, PasswordHasher,
};
use mantia_domain::IdentitySeed;
use tracing::info;

use crate::bootstrap_config::BootstrapMode;
use crate::bootstrap_error::BootstrapFailure;

/// Adapters the bootstrap sequence runs against.
pub struct BootstrapPorts {
    pub probe: Arc<dyn DatabaseProbe>,
    pub migrations: Arc<dyn MigrationRepository>,
    pub identity: Arc<dyn IdentityRepository>,
    pub password_hasher: Arc<dyn PasswordHasher>,
}

/// Static inputs of one bootstrap run.
pub struct BootstrapPlan {
    pub mode: BootstrapMode,
    pub gate_policy: GatePolicy,
    pub seed: IdentitySeed,
}

/// Runs the sequence. Nothing touches the schema before the gate reports
/// ready, and nothing is seeded unless every migration unit applied.
pub async fn run_bootstrap(
    plan: BootstrapPlan,
    ports: BootstrapPorts,
) -> Result<(), BootstrapFailure> {
    let target = ports.probe.target();

    if let GateOutcome::Unavailable {
        attempts,
        last_error,
    } = ConnectivityGate::new(ports.probe, plan.gate_policy)
        .wait_for_database()
        .await
    {
        return Err(BootstrapFailure::DatabaseUnavailable {
            target,
            attempts,
            last_error,
        });
    }

    MigrationService::new(ports.migrations).apply().await?;

    if plan.mode == BootstrapMode::MigrateOnly {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let seeded = BootstrapSeeder::new(ports.identity, ports.password_hasher, plan.seed)
        .ensure_default_identity()
        .await
        .map_err(BootstrapFailure::Seeding)?;

    info!(
        administrator_created = seeded.created,
        "bootstrap complete, application can start"
    );

    Ok(())
}

#[cfg(test)]
mod tests;
