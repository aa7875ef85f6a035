//! PostgreSQL-backed identity repository over the RBAC tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use mantia_application::{
    AdministratorProvisioning, IdentityRepository, IdentitySummary, UserRecord,
};
use mantia_core::{AppError, AppResult};
use mantia_domain::{IdentitySeed, RoleId, UserId};

/// PostgreSQL implementation of the identity repository port.
#[derive(Clone)]
pub struct PostgresIdentityRepository {
    pool: PgPool,
}

impl PostgresIdentityRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    username: String,
    email: String,
    hashed_password: String,
    nombre_completo: Option<String>,
    activo: bool,
    es_admin: bool,
    rol_id: Option<i32>,
    debe_cambiar_password: bool,
    intentos_fallidos: i32,
    bloqueado_hasta: Option<DateTime<Utc>>,
    fecha_creacion: DateTime<Utc>,
    ultima_conexion: Option<DateTime<Utc>>,
    fecha_cambio_password: Option<DateTime<Utc>>,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::new(row.id),
            username: row.username,
            email: row.email,
            password_hash: row.hashed_password,
            full_name: row.nombre_completo,
            active: row.activo,
            is_admin: row.es_admin,
            role_id: row.rol_id.map(RoleId::new),
            must_change_password: row.debe_cambiar_password,
            failed_attempts: row.intentos_fallidos,
            locked_until: row.bloqueado_hasta,
            created_at: row.fecha_creacion,
            last_login: row.ultima_conexion,
            password_changed_at: row.fecha_cambio_password,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    users: i64,
    roles: i64,
    permissions: i64,
    pages: i64,
}

mod lookup;
mod provision;

#[async_trait]
impl IdentityRepository for PostgresIdentityRepository {
    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<UserRecord>> {
        self.find_user_by_username_impl(username).await
    }

    async fn ensure_reference_data(&self, seed: &IdentitySeed) -> AppResult<RoleId> {
        self.ensure_reference_data_impl(seed).await
    }

    async fn provision_administrator(
        &self,
        seed: &IdentitySeed,
        role_id: RoleId,
        password_hash: &str,
    ) -> AppResult<AdministratorProvisioning> {
        self.provision_administrator_impl(seed, role_id, password_hash).await
    }

    async fn summarize(&self) -> AppResult<IdentitySummary> {
        self.summarize_impl().await
    }
}

fn unique_conflict_or_internal(error: sqlx::Error, operation: &str) -> AppError {
    if let sqlx::Error::Database(ref database_error) = error
        && database_error.code().as_deref() == Some("23505")
    {
        let constraint = database_error.constraint().unwrap_or("unique constraint");
        return AppError::Conflict(format!("failed to {operation}: {constraint} already taken"));
    }

    AppError::Internal(format!("failed to {operation}: {error}"))
}
