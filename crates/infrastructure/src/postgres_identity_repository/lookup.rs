use super::*;

impl PostgresIdentityRepository {
    pub(super) async fn find_user_by_username_impl(
        &self,
        username: &str,
    ) -> AppResult<Option<UserRecord>> {
        // Tables created by older releases use TIMESTAMP and nullable flags.
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, hashed_password, nombre_completo,
                   COALESCE(activo, TRUE) AS activo,
                   COALESCE(es_admin, FALSE) AS es_admin,
                   rol_id,
                   COALESCE(debe_cambiar_password, FALSE) AS debe_cambiar_password,
                   COALESCE(intentos_fallidos, 0) AS intentos_fallidos,
                   bloqueado_hasta::timestamptz AS bloqueado_hasta,
                   COALESCE(fecha_creacion::timestamptz, now()) AS fecha_creacion,
                   ultima_conexion::timestamptz AS ultima_conexion,
                   fecha_cambio_password::timestamptz AS fecha_cambio_password
            FROM usuarios
            WHERE username = $1
            LIMIT 1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find user by username: {error}"))
        })?;

        Ok(row.map(UserRecord::from))
    }

    pub(super) async fn summarize_impl(&self) -> AppResult<IdentitySummary> {
        let row = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM usuarios) AS users,
                (SELECT COUNT(*) FROM roles) AS roles,
                (SELECT COUNT(*) FROM permisos) AS permissions,
                (SELECT COUNT(*) FROM paginas) AS pages
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to count identity rows: {error}")))?;

        Ok(IdentitySummary {
            users: row.users,
            roles: row.roles,
            permissions: row.permissions,
            pages: row.pages,
        })
    }
}
