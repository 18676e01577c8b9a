// src/db/grant_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    access::GrantStore,
    common::error::AppError,
    models::permission::{GrantLevel, PermissionGrant, PermissionLevel},
};

// Concessões por (usuário, prédio), tabela 'user_building_permissions'
#[derive(Clone)]
pub struct GrantRepository {
    pool: PgPool,
}

impl GrantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_active_by_id<'e, E>(
        &self,
        executor: E,
        grant_id: Uuid,
    ) -> Result<Option<PermissionGrant>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let grant = sqlx::query_as::<_, PermissionGrant>(
            r#"
            SELECT id, user_id, building_id, level, granted_by, granted_at, expires_at, is_deleted
            FROM user_building_permissions
            WHERE id = $1 AND NOT is_deleted
            "#,
        )
            .bind(grant_id)
            .fetch_optional(executor)
            .await?;

        Ok(grant)
    }

    // Remove (soft) a concessão ativa do par, se houver. Devolve a linha removida.
    pub async fn soft_delete_active_for_pair<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        building_id: Uuid,
    ) -> Result<Option<PermissionGrant>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let previous = sqlx::query_as::<_, PermissionGrant>(
            r#"
            UPDATE user_building_permissions
            SET is_deleted = TRUE
            WHERE user_id = $1 AND building_id = $2 AND NOT is_deleted
            RETURNING id, user_id, building_id, level, granted_by, granted_at, expires_at, is_deleted
            "#,
        )
            .bind(user_id)
            .bind(building_id)
            .fetch_optional(executor)
            .await?;

        Ok(previous)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        building_id: Uuid,
        level: PermissionLevel,
        granted_by: Uuid,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<PermissionGrant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let grant = sqlx::query_as::<_, PermissionGrant>(
            r#"
            INSERT INTO user_building_permissions (id, user_id, building_id, level, granted_by, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, building_id, level, granted_by, granted_at, expires_at, is_deleted
            "#,
        )
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(building_id)
            .bind(level)
            .bind(granted_by)
            .bind(expires_at)
            .fetch_one(executor)
            .await?;

        Ok(grant)
    }

    pub async fn soft_delete<'e, E>(&self, executor: E, grant_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE user_building_permissions SET is_deleted = TRUE WHERE id = $1")
            .bind(grant_id)
            .execute(executor)
            .await?;

        Ok(())
    }

    // Concessões válidas em `now` para um prédio (a tela "quem tem acesso")
    pub async fn list_valid_for_building<'e, E>(
        &self,
        executor: E,
        building_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<PermissionGrant>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let grants = sqlx::query_as::<_, PermissionGrant>(
            r#"
            SELECT id, user_id, building_id, level, granted_by, granted_at, expires_at, is_deleted
            FROM user_building_permissions
            WHERE building_id = $1
              AND NOT is_deleted
              AND (expires_at IS NULL OR expires_at >= $2)
            ORDER BY granted_at DESC
            "#,
        )
            .bind(building_id)
            .bind(now)
            .fetch_all(executor)
            .await?;

        Ok(grants)
    }
}

#[async_trait]
impl GrantStore for GrantRepository {
    async fn valid_grants_for_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<GrantLevel>, AppError> {
        let grants = sqlx::query_as::<_, GrantLevel>(
            r#"
            SELECT building_id, level
            FROM user_building_permissions
            WHERE user_id = $1
              AND NOT is_deleted
              AND (expires_at IS NULL OR expires_at >= $2)
            "#,
        )
            .bind(user_id)
            .bind(now)
            .fetch_all(&self.pool)
            .await?;

        Ok(grants)
    }

    async fn valid_grants_for_user_and_building(
        &self,
        user_id: Uuid,
        building_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<PermissionLevel>, AppError> {
        let levels = sqlx::query_scalar::<_, PermissionLevel>(
            r#"
            SELECT level
            FROM user_building_permissions
            WHERE user_id = $1
              AND building_id = $2
              AND NOT is_deleted
              AND (expires_at IS NULL OR expires_at >= $3)
            "#,
        )
            .bind(user_id)
            .bind(building_id)
            .bind(now)
            .fetch_all(&self.pool)
            .await?;

        Ok(levels)
    }
}
