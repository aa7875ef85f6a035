//! Mantia bootstrap: waits for PostgreSQL, applies schema migrations, and
//! seeds the default administrator before the application server starts.

#![forbid(unsafe_code)]

mod bootstrap_config;
mod bootstrap_error;
mod bootstrap_runner;

use std::process::ExitCode;
use std::sync::Arc;

use mantia_infrastructure::{
    Argon2PasswordHasher, PostgresConnectionProbe, PostgresIdentityRepository,
    PostgresMigrationRepository,
};
use sqlx::postgres::PgPoolOptions;
use tracing::{error, warn};

use crate::bootstrap_config::{BootstrapConfig, init_tracing};
use crate::bootstrap_error::BootstrapFailure;
use crate::bootstrap_runner::{BootstrapPlan, BootstrapPorts, run_bootstrap};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    // Dropping `run` on a signal aborts the gate loop and rolls back any
    // open transaction.
    let outcome = tokio::select! {
        outcome = run() => outcome,
        () = wait_for_shutdown_signal() => Err(BootstrapFailure::Interrupted),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            error!(
                exit_code = failure.exit_code(),
                error = %failure,
                detail = ?failure,
                "bootstrap failed"
            );
            ExitCode::from(&failure)
        }
    }
}

async fn run() -> Result<(), BootstrapFailure> {
    let config = BootstrapConfig::load().map_err(BootstrapFailure::Configuration)?;

    // Lazy: no connection is opened before the gate reports ready.
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(config.connect_timeout)
        .connect_lazy_with(config.connect_options.clone());

    let migrations = match &config.migrations_dir {
        Some(directory) => PostgresMigrationRepository::from_directory(pool.clone(), directory)
            .await
            .map_err(BootstrapFailure::Configuration)?,
        None => PostgresMigrationRepository::embedded(pool.clone()),
    };

    let ports = BootstrapPorts {
        probe: Arc::new(PostgresConnectionProbe::new(
            config.connect_options.clone(),
            config.connect_timeout,
        )),
        migrations: Arc::new(migrations),
        identity: Arc::new(PostgresIdentityRepository::new(pool.clone())),
        password_hasher: Arc::new(Argon2PasswordHasher::new()),
    };
    let plan = BootstrapPlan {
        mode: config.mode,
        gate_policy: config.gate_policy,
        seed: config.identity_seed(),
    };

    let outcome = run_bootstrap(plan, ports).await;
    pool.close().await;
    outcome
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
            }
            (Err(error), _) | (_, Err(error)) => {
                warn!(error = %error, "failed to register shutdown signal handlers");
                std::future::pending::<()>().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!(error = %error, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    }
}
