use std::process::ExitCode;

use mantia_application::MigrationFailure;
use mantia_core::AppError;
use thiserror::Error;

/// Fatal bootstrap outcomes, each with its own process exit code.
#[derive(Debug, Error)]
pub enum BootstrapFailure {
    #[error("invalid configuration: {0}")]
    Configuration(#[source] AppError),

    #[error("database {target} unavailable after {attempts} attempts: {last_error}")]
    DatabaseUnavailable {
        target: String,
        attempts: u32,
        last_error: String,
    },

    #[error(transparent)]
    Migration(#[from] MigrationFailure),

    #[error("failed to seed default identity: {0}")]
    Seeding(#[source] AppError),

    #[error("interrupted by shutdown signal")]
    Interrupted,
}

impl BootstrapFailure {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration(_) => 2,
            Self::DatabaseUnavailable { .. } => 3,
            Self::Migration(_) => 4,
            Self::Seeding(_) => 5,
            Self::Interrupted => 130,
        }
    }
}

impl From<&BootstrapFailure> for ExitCode {
    fn from(failure: &BootstrapFailure) -> Self {
        ExitCode::from(failure.exit_code())
    }
}

#[cfg(test)]
mod tests {
    use mantia_domain::MigrationVersion;

    use super::*;

    #[test]
    fn each_failure_kind_has_a_distinct_exit_code() {
        let version = MigrationVersion::new(2).unwrap_or_else(|_| unreachable!());
        let failures = [
            BootstrapFailure::Configuration(AppError::Validation(
                "DATABASE_URL is required".to_owned(),
            )),
            BootstrapFailure::DatabaseUnavailable {
                target: "db:5432/mantia".to_owned(),
                attempts: 30,
                last_error: "connection refused".to_owned(),
            },
            BootstrapFailure::Migration(MigrationFailure::Unit {
                version,
                identifier: "002 add user system".to_owned(),
                cause: AppError::Internal("syntax error".to_owned()),
            }),
            BootstrapFailure::Seeding(AppError::Conflict("usuarios_email_key".to_owned())),
            BootstrapFailure::Interrupted,
        ];

        let codes: Vec<u8> = failures.iter().map(BootstrapFailure::exit_code).collect();
        assert_eq!(codes, vec![2, 3, 4, 5, 130]);
    }

    #[test]
    fn messages_name_the_failing_step() {
        let unavailable = BootstrapFailure::DatabaseUnavailable {
            target: "db:5432/mantia".to_owned(),
            attempts: 30,
            last_error: "connection refused".to_owned(),
        };
        assert_eq!(
            unavailable.to_string(),
            "database db:5432/mantia unavailable after 30 attempts: connection refused"
        );

        let version = MigrationVersion::new(1).unwrap_or_else(|_| unreachable!());
        let migration = BootstrapFailure::from(MigrationFailure::Unit {
            version,
            identifier: "001 add storage locations".to_owned(),
            cause: AppError::Internal("statement failed".to_owned()),
        });
        assert!(migration.to_string().contains("001 add storage locations"));
    }
}
