//! Throwaway PostgreSQL schemas for database tests gated on `DATABASE_URL`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use mantia_application::{MigrationReport, MigrationService};
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use crate::PostgresMigrationRepository;

static SEQUENCE: AtomicU32 = AtomicU32::new(0);

/// A schema placed first on the `search_path` of every pool it hands out,
/// so each test sees an empty database.
pub(crate) struct TestSchema {
    pub(crate) pool: PgPool,
    options: PgConnectOptions,
    admin: PgPool,
    name: String,
}

pub(crate) async fn isolated_schema(label: &str) -> Option<TestSchema> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let options = match database_url.parse::<PgConnectOptions>() {
        Ok(options) => options,
        Err(error) => panic!("DATABASE_URL is not a valid connection URL: {error}"),
    };
    let admin = match PgPoolOptions::new()
        .max_connections(1)
        .connect_with(options.clone())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    let name = format!(
        "mantia_{label}_{}_{}",
        std::process::id(),
        SEQUENCE.fetch_add(1, Ordering::Relaxed)
    );
    if let Err(error) = sqlx::query(format!("CREATE SCHEMA {name}").as_str())
        .execute(&admin)
        .await
    {
        panic!("failed to create test schema {name}: {error}");
    }

    let options = options.options([("search_path", name.as_str())]);
    let pool = connect(&options).await;

    Some(TestSchema {
        pool,
        options,
        admin,
        name,
    })
}

async fn connect(options: &PgConnectOptions) -> PgPool {
    match PgPoolOptions::new()
        .max_connections(4)
        .connect_with(options.clone())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to test schema: {error}"),
    }
}

impl TestSchema {
    /// Opens an independent pool on the same schema, like a second replica.
    pub(crate) async fn replica_pool(&self) -> PgPool {
        connect(&self.options).await
    }

    /// Applies the embedded units and panics on failure.
    pub(crate) async fn migrate(&self) -> MigrationReport {
        let repository = PostgresMigrationRepository::embedded(self.pool.clone());
        let service =
            MigrationService::new(Arc::new(repository)).with_contention_policy(10, Duration::ZERO);
        match service.apply().await {
            Ok(report) => report,
            Err(error) => panic!("failed to migrate test schema {}: {error}", self.name),
        }
    }

    pub(crate) async fn drop_schema(self) {
        self.pool.close().await;
        let _ = sqlx::query(format!("DROP SCHEMA IF EXISTS {} CASCADE", self.name).as_str())
            .execute(&self.admin)
            .await;
        self.admin.close().await;
    }
}
