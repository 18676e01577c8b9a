// src/services/renter_service.rs
//
// Locatários pertencem ao workspace, não a um prédio: o escopo aqui é só o isolamento.

use std::sync::Arc;

use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    access::AccessGuard,
    common::{cipher::FieldCipher, error::AppError},
    db::{AuditRepository, FinanceRepository},
    models::{
        audit::{field_changes, snapshot, AuditAction, AuditEntry, EntityType},
        auth::User,
        finance::{CreateRenterPayload, Renter, RenterDetails, UpdateRenterPayload},
    },
};

// O documento nunca entra no log de auditoria em claro
const REDACTED: &str = "[cifrado]";

#[derive(Clone)]
pub struct RenterService {
    pool: PgPool,
    finance_repo: FinanceRepository,
    audit_repo: AuditRepository,
    guard: AccessGuard,
    cipher: Arc<dyn FieldCipher>,
}

impl RenterService {
    pub fn new(
        pool: PgPool,
        finance_repo: FinanceRepository,
        audit_repo: AuditRepository,
        guard: AccessGuard,
        cipher: Arc<dyn FieldCipher>,
    ) -> Self {
        Self {
            pool,
            finance_repo,
            audit_repo,
            guard,
            cipher,
        }
    }

    async fn renter_for(&self, user: &User, renter_id: Uuid) -> Result<Renter, AppError> {
        match self.finance_repo.find_renter(&self.pool, renter_id).await? {
            Some(renter) if renter.workspace_id == user.workspace_id => Ok(renter),
            _ => self.guard.deny(user, EntityType::Renter, Some(renter_id)).await,
        }
    }

    pub async fn create(&self, user: &User, payload: CreateRenterPayload) -> Result<Renter, AppError> {
        payload.validate()?;

        let encrypted = self.cipher.encrypt(&payload.id_number)?;

        let mut tx = self.pool.begin().await?;

        let renter = self
            .finance_repo
            .create_renter(&mut *tx, user.workspace_id, &payload, &encrypted)
            .await?;

        let entry = AuditEntry::new(user.id, AuditAction::Create, EntityType::Renter, renter.id)
            .with_new_values(snapshot(&renter));
        self.audit_repo.record_in(&mut *tx, &entry).await?;

        tx.commit().await?;
        Ok(renter)
    }

    pub async fn get(&self, user: &User, renter_id: Uuid) -> Result<RenterDetails, AppError> {
        let renter = self.renter_for(user, renter_id).await?;
        let id_number = self.cipher.decrypt(&renter.id_number)?;

        Ok(RenterDetails { renter, id_number })
    }

    pub async fn update(
        &self,
        user: &User,
        renter_id: Uuid,
        payload: UpdateRenterPayload,
    ) -> Result<Renter, AppError> {
        payload.validate()?;

        let renter = self.renter_for(user, renter_id).await?;

        // 1. Campos em claro + o documento (que não serializa)
        let changes = field_changes(&renter, &payload);
        if changes.is_none() && payload.id_number.is_none() {
            return Ok(renter);
        }
        let (mut old_values, mut new_values) = changes.unwrap_or_else(|| (json!({}), json!({})));
        if payload.id_number.is_some() {
            mark_redacted(&mut old_values);
            mark_redacted(&mut new_values);
        }

        // 2. Recifra o documento, se veio
        let encrypted = payload
            .id_number
            .as_deref()
            .map(|id_number| self.cipher.encrypt(id_number))
            .transpose()?;

        let mut tx = self.pool.begin().await?;

        let updated = self
            .finance_repo
            .update_renter(&mut *tx, renter_id, &payload, encrypted.as_deref())
            .await?;

        let entry = AuditEntry::new(user.id, AuditAction::Update, EntityType::Renter, renter_id)
            .with_old_values(old_values)
            .with_new_values(new_values);
        self.audit_repo.record_in(&mut *tx, &entry).await?;

        tx.commit().await?;
        Ok(updated)
    }

    pub async fn delete(&self, user: &User, renter_id: Uuid) -> Result<(), AppError> {
        let renter = self.renter_for(user, renter_id).await?;

        let active = self
            .finance_repo
            .count_active_contracts_for_renter(&self.pool, renter_id)
            .await?;
        if active > 0 {
            return Err(AppError::BusinessRule(
                "Não é possível remover um locatário com contratos ativos.".into(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        self.finance_repo.soft_delete_renter(&mut *tx, renter_id).await?;

        let entry = AuditEntry::new(user.id, AuditAction::Delete, EntityType::Renter, renter_id)
            .with_old_values(snapshot(&renter));
        self.audit_repo.record_in(&mut *tx, &entry).await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn list(&self, user: &User) -> Result<Vec<Renter>, AppError> {
        self.finance_repo.list_renters(&self.pool, user.workspace_id).await
    }
}

fn mark_redacted(values: &mut Value) {
    if let Value::Object(map) = values {
        map.insert("idNumber".into(), Value::String(REDACTED.into()));
    }
}
