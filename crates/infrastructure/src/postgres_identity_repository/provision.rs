use sqlx::{Postgres, Transaction};

use super::*;

impl PostgresIdentityRepository {
    pub(super) async fn ensure_reference_data_impl(
        &self,
        seed: &IdentitySeed,
    ) -> AppResult<RoleId> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        let role_id = ensure_role(&mut transaction, seed).await?;
        insert_catalog(&mut transaction, seed).await?;

        let permission_names: Vec<String> = seed
            .permissions()
            .iter()
            .map(|permission| permission.name.clone())
            .collect();

        sqlx::query(
            r#"
            INSERT INTO roles_permisos (rol_id, permiso_id)
            SELECT $1, id FROM permisos WHERE nombre = ANY($2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(role_id.value())
        .bind(&permission_names)
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to persist role grants: {error}")))?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(role_id)
    }

    pub(super) async fn provision_administrator_impl(
        &self,
        seed: &IdentitySeed,
        role_id: RoleId,
        password_hash: &str,
    ) -> AppResult<AdministratorProvisioning> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        let administrator = seed.administrator();
        let user_id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO usuarios (
                username, email, hashed_password, nombre_completo, activo, es_admin, rol_id,
                debe_cambiar_password, intentos_fallidos, bloqueado_hasta
            )
            VALUES ($1, $2, $3, $4, TRUE, TRUE, $5, TRUE, 0, NULL)
            ON CONFLICT (username) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(administrator.username.as_str())
        .bind(administrator.email.as_str())
        .bind(password_hash)
        .bind(administrator.full_name.as_str())
        .bind(role_id.value())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| unique_conflict_or_internal(error, "create administrator"))?;

        let Some(user_id) = user_id.map(UserId::new) else {
            transaction.rollback().await.map_err(|error| {
                AppError::Internal(format!("failed to roll back transaction: {error}"))
            })?;
            return Ok(AdministratorProvisioning::AlreadyExists);
        };

        let page_names: Vec<String> = seed.pages().iter().map(|page| page.name.clone()).collect();

        sqlx::query(
            r#"
            INSERT INTO usuarios_paginas (usuario_id, pagina_id)
            SELECT $1, id FROM paginas WHERE nombre = ANY($2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id.value())
        .bind(&page_names)
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to persist page grants: {error}")))?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(AdministratorProvisioning::Created { user_id, role_id })
    }
}

async fn ensure_role(
    transaction: &mut Transaction<'_, Postgres>,
    seed: &IdentitySeed,
) -> AppResult<RoleId> {
    let role = seed.role();

    let inserted = sqlx::query_scalar::<_, i32>(
        r#"
        INSERT INTO roles (nombre, descripcion, activo)
        VALUES ($1, $2, TRUE)
        ON CONFLICT (nombre) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(role.name.as_str())
    .bind(role.description.as_str())
    .fetch_optional(&mut **transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to create role: {error}")))?;

    if let Some(role_id) = inserted {
        return Ok(RoleId::new(role_id));
    }

    sqlx::query_scalar::<_, i32>("SELECT id FROM roles WHERE nombre = $1")
        .bind(role.name.as_str())
        .fetch_one(&mut **transaction)
        .await
        .map(RoleId::new)
        .map_err(|error| AppError::Internal(format!("failed to load role: {error}")))
}

async fn insert_catalog(
    transaction: &mut Transaction<'_, Postgres>,
    seed: &IdentitySeed,
) -> AppResult<()> {
    for permission in seed.permissions() {
        sqlx::query(
            r#"
            INSERT INTO permisos (nombre, descripcion, recurso, accion, activo)
            VALUES ($1, $2, $3, $4, TRUE)
            ON CONFLICT (nombre) DO NOTHING
            "#,
        )
        .bind(permission.name.as_str())
        .bind(permission.description.as_str())
        .bind(permission.resource.as_str())
        .bind(permission.action.as_str())
        .execute(&mut **transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to create permission '{}': {error}",
                permission.name
            ))
        })?;
    }

    // Pages are unique by name and by route; either match means present.
    for page in seed.pages() {
        sqlx::query(
            r#"
            INSERT INTO paginas (nombre, ruta, titulo, descripcion, icono, orden, activa, solo_admin)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(page.name.as_str())
        .bind(page.route.as_str())
        .bind(page.title.as_str())
        .bind(page.description.as_deref())
        .bind(page.icon.as_deref())
        .bind(page.order)
        .bind(page.admin_only)
        .execute(&mut **transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to create page '{}': {error}", page.name))
        })?;
    }

    Ok(())
}
