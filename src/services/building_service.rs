// src/services/building_service.rs

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    access::{AccessGuard, Annotated, BulkPermissionAnnotator},
    common::error::AppError,
    db::{AuditRepository, HoldingsRepository},
    models::{
        audit::{field_changes, snapshot, AuditAction, AuditEntry, EntityType},
        auth::User,
        holdings::{Building, CreateBuildingPayload, UpdateBuildingPayload},
        permission::PermissionLevel,
    },
};

#[derive(Clone)]
pub struct BuildingService {
    pool: PgPool,
    holdings_repo: HoldingsRepository,
    audit_repo: AuditRepository,
    guard: AccessGuard,
    annotator: BulkPermissionAnnotator,
}

impl BuildingService {
    pub fn new(
        pool: PgPool,
        holdings_repo: HoldingsRepository,
        audit_repo: AuditRepository,
        guard: AccessGuard,
        annotator: BulkPermissionAnnotator,
    ) -> Self {
        Self {
            pool,
            holdings_repo,
            audit_repo,
            guard,
            annotator,
        }
    }

    // Só o OWNER cria prédios (não existe prédio para conceder CREATE antes dele existir)
    pub async fn create(&self, user: &User, payload: CreateBuildingPayload) -> Result<Building, AppError> {
        payload.validate()?;

        if !user.is_owner() {
            return self.guard.deny(user, EntityType::Building, None).await;
        }

        let mut tx = self.pool.begin().await?;

        let building = self
            .holdings_repo
            .create_building(&mut *tx, user.workspace_id, user.id, &payload)
            .await?;

        let entry = AuditEntry::new(user.id, AuditAction::Create, EntityType::Building, building.id)
            .with_new_values(snapshot(&building));
        self.audit_repo.record_in(&mut *tx, &entry).await?;

        tx.commit().await?;

        tracing::info!(building_id = %building.id, "🏢 Prédio criado");
        Ok(building)
    }

    pub async fn get(&self, user: &User, building_id: Uuid) -> Result<Building, AppError> {
        self.guard
            .require_building(user, building_id, PermissionLevel::View)
            .await
    }

    pub async fn update(
        &self,
        user: &User,
        building_id: Uuid,
        payload: UpdateBuildingPayload,
    ) -> Result<Building, AppError> {
        payload.validate()?;

        // 1. Autorização (carrega o estado atual)
        let building = self
            .guard
            .require_building(user, building_id, PermissionLevel::Update)
            .await?;

        // 2. Patch vazio: nada muda, nada é auditado
        let Some((old_values, new_values)) = field_changes(&building, &payload) else {
            return Ok(building);
        };

        // 3. Mutação + auditoria na mesma transação
        let mut tx = self.pool.begin().await?;

        let updated = self
            .holdings_repo
            .update_building(&mut *tx, building_id, &payload)
            .await?;

        let entry = AuditEntry::new(user.id, AuditAction::Update, EntityType::Building, building_id)
            .with_old_values(old_values)
            .with_new_values(new_values);
        self.audit_repo.record_in(&mut *tx, &entry).await?;

        tx.commit().await?;
        Ok(updated)
    }

    pub async fn delete(&self, user: &User, building_id: Uuid) -> Result<(), AppError> {
        let building = self
            .guard
            .require_building(user, building_id, PermissionLevel::Delete)
            .await?;

        let mut tx = self.pool.begin().await?;

        self.holdings_repo.soft_delete_building(&mut *tx, building_id).await?;

        let entry = AuditEntry::new(user.id, AuditAction::Delete, EntityType::Building, building_id)
            .with_old_values(snapshot(&building));
        self.audit_repo.record_in(&mut *tx, &entry).await?;

        tx.commit().await?;

        tracing::info!(building_id = %building_id, "🗑️ Prédio removido");
        Ok(())
    }

    /// Prédios do workspace que o usuário enxerga, cada um com seu nível efetivo.
    pub async fn list_for_user(&self, user: &User) -> Result<Vec<Annotated<Building>>, AppError> {
        let buildings = self
            .holdings_repo
            .list_buildings(&self.pool, user.workspace_id)
            .await?;

        self.annotator.visible(user, buildings).await
    }
}
