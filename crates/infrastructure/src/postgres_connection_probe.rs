//! PostgreSQL reachability probe used by the connectivity gate.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgConnectOptions;
use sqlx::{Connection, PgConnection};

use mantia_application::DatabaseProbe;
use mantia_core::{AppError, AppResult};

/// Opens a dedicated connection, runs `SELECT 1`, and closes it.
#[derive(Clone)]
pub struct PostgresConnectionProbe {
    options: PgConnectOptions,
    connect_timeout: Duration,
}

impl PostgresConnectionProbe {
    /// Creates a probe for the given connection options.
    #[must_use]
    pub fn new(options: PgConnectOptions, connect_timeout: Duration) -> Self {
        Self {
            options,
            connect_timeout,
        }
    }

    async fn round_trip(&self) -> AppResult<()> {
        let mut connection = PgConnection::connect_with(&self.options)
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect: {error}")))?;

        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&mut connection)
            .await
            .map_err(|error| AppError::Internal(format!("probe query failed: {error}")))?;

        connection.close().await.map_err(|error| {
            AppError::Internal(format!("failed to close probe connection: {error}"))
        })
    }
}

#[async_trait]
impl DatabaseProbe for PostgresConnectionProbe {
    async fn probe(&self) -> AppResult<()> {
        tokio::time::timeout(self.connect_timeout, self.round_trip())
            .await
            .map_err(|_| {
                AppError::Internal(format!(
                    "connection attempt timed out after {}s",
                    self.connect_timeout.as_secs()
                ))
            })?
    }

    fn target(&self) -> String {
        format!(
            "{}:{}/{}",
            self.options.get_host(),
            self.options.get_port(),
            self.options.get_database().unwrap_or_default()
        )
    }
}
