use std::env;
use std::path::PathBuf;
use std::time::Duration;

use mantia_application::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_INTERVAL, GatePolicy};
use mantia_core::{AppError, NonEmptyString};
use mantia_domain::IdentitySeed;
use sqlx::postgres::PgConnectOptions;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapMode {
    /// Gate, migrations, and identity seeding.
    Full,
    /// Gate and migrations only.
    MigrateOnly,
}

/// Runtime settings. Not `Debug`: the connect options carry
/// the database password.
#[derive(Clone)]
pub struct BootstrapConfig {
    pub mode: BootstrapMode,
    pub connect_options: PgConnectOptions,
    pub gate_policy: GatePolicy,
    pub connect_timeout: Duration,
    pub migrations_dir: Option<PathBuf>,
    pub admin_password: Option<NonEmptyString>,
}

impl BootstrapConfig {
    pub fn load() -> Result<Self, AppError> {
        let command = env::args().nth(1);
        Self::from_lookup(command.as_deref(), |name| env::var(name).ok())
    }

    pub fn from_lookup(
        command: Option<&str>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let mode = match command {
            None => BootstrapMode::Full,
            Some("migrate") => BootstrapMode::MigrateOnly,
            Some(other) => {
                return Err(AppError::Validation(format!(
                    "unknown command '{other}', expected 'migrate' or no argument"
                )));
            }
        };

        let database_url = lookup("DATABASE_URL")
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| AppError::Validation("DATABASE_URL is required".to_owned()))?;
        // The parse error is dropped since it may echo the URL back.
        let connect_options = database_url.parse::<PgConnectOptions>().map_err(|_| {
            AppError::Validation("DATABASE_URL is not a valid PostgreSQL connection URL".to_owned())
        })?;

        let max_attempts = optional_number(&lookup, "DB_WAIT_MAX_ATTEMPTS")?
            .map(u32::try_from)
            .transpose()
            .map_err(|_| AppError::Validation("DB_WAIT_MAX_ATTEMPTS is too large".to_owned()))?
            .unwrap_or(DEFAULT_MAX_ATTEMPTS);
        let interval = optional_number(&lookup, "DB_WAIT_INTERVAL_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_RETRY_INTERVAL);
        let gate_policy = GatePolicy::new(max_attempts, interval).map_err(|_| {
            AppError::Validation("DB_WAIT_MAX_ATTEMPTS must be at least 1".to_owned())
        })?;

        let connect_timeout = Duration::from_secs(
            optional_number(&lookup, "DB_CONNECT_TIMEOUT_SECS")?
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
        );
        if connect_timeout.is_zero() {
            return Err(AppError::Validation(
                "DB_CONNECT_TIMEOUT_SECS must be at least 1".to_owned(),
            ));
        }

        let migrations_dir = optional_value(&lookup, "MIGRATIONS_DIR").map(PathBuf::from);
        let admin_password = optional_value(&lookup, "BOOTSTRAP_ADMIN_PASSWORD")
            .map(NonEmptyString::new)
            .transpose()?;

        Ok(Self {
            mode,
            connect_options,
            gate_policy,
            connect_timeout,
            migrations_dir,
            admin_password,
        })
    }

    pub fn identity_seed(&self) -> IdentitySeed {
        match &self.admin_password {
            Some(password) => IdentitySeed::reserved().with_initial_password(password.clone()),
            None => IdentitySeed::reserved(),
        }
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn optional_value(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).filter(|value| !value.trim().is_empty())
}

fn optional_number(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<u64>, AppError> {
    optional_value(lookup, name)
        .map(|value| {
            value
                .trim()
                .parse::<u64>()
                .map_err(|error| AppError::Validation(format!("invalid {name}: {error}")))
        })
        .transpose()
}
