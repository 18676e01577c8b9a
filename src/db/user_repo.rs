// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::auth::{CreateMemberPayload, UpdateMemberPayload, User},
};

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // Busca um usuário ativo pelo seu e-mail
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let maybe_user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE email = $1 AND NOT is_deleted",
        )
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(maybe_user)
    }

    // Busca um usuário ativo pelo seu ID
    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let maybe_user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE id = $1 AND NOT is_deleted",
        )
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(maybe_user)
    }

    // Cria um membro da equipe no workspace do OWNER.
    // E-mail duplicado vira AppError::EmailAlreadyExists.
    pub async fn create_member<'e, E>(
        &self,
        executor: E,
        workspace_id: Uuid,
        created_by: Uuid,
        payload: &CreateMemberPayload,
        password_hash: &str,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (
                id, workspace_id, email, password_hash, first_name, last_name, phone, role, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
            .bind(Uuid::new_v4())
            .bind(workspace_id)
            .bind(&payload.email)
            .bind(password_hash)
            .bind(&payload.first_name)
            .bind(&payload.last_name)
            .bind(&payload.phone)
            .bind(payload.role)
            .bind(created_by)
            .fetch_one(executor)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return AppError::EmailAlreadyExists;
                    }
                }
                e.into()
            })?;

        Ok(user)
    }

    pub async fn update_member<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        payload: &UpdateMemberPayload,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                phone = COALESCE($4, phone),
                role = COALESCE($5, role),
                updated_at = NOW()
            WHERE id = $1 AND NOT is_deleted
            RETURNING *
            "#,
        )
            .bind(user_id)
            .bind(&payload.first_name)
            .bind(&payload.last_name)
            .bind(&payload.phone)
            .bind(payload.role)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("Usuário"))?;

        Ok(user)
    }

    pub async fn list_by_workspace<'e, E>(&self, executor: E, workspace_id: Uuid) -> Result<Vec<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE workspace_id = $1 AND NOT is_deleted
            ORDER BY role ASC, last_name ASC
            "#,
        )
            .bind(workspace_id)
            .fetch_all(executor)
            .await?;

        Ok(users)
    }
}
