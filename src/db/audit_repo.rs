// src/db/audit_repo.rs

use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres};

use crate::{access::AuditSink, common::error::AppError, models::audit::AuditEntry};

// Grava em 'audit_logs'. Dentro de uma transação (record_in) ou direto no pool (AuditSink).
#[derive(Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn record_in<'e, E>(&self, executor: E, entry: &AuditEntry) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (
                id, actor_id, action, entity_type, entity_id, old_values, new_values, action_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
            .bind(entry.id)
            .bind(entry.actor_id)
            .bind(entry.action)
            .bind(entry.entity_type.as_str())
            .bind(entry.entity_id)
            .bind(&entry.old_values)
            .bind(&entry.new_values)
            .bind(entry.action_date)
            .execute(executor)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl AuditSink for AuditRepository {
    async fn record(&self, entry: AuditEntry) -> Result<(), AppError> {
        self.record_in(&self.pool, &entry).await
    }
}
