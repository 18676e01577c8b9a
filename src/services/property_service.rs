// src/services/property_service.rs

use chrono::{DateTime, Utc};
use rand::Rng;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    access::{AccessGuard, Annotated, BulkPermissionAnnotator, PropertyWithBuilding},
    common::error::AppError,
    db::{AuditRepository, HoldingsRepository},
    models::{
        audit::{field_changes, snapshot, AuditAction, AuditEntry, EntityType},
        auth::User,
        holdings::{
            CreatePropertyPayload, Property, PropertyStatus, PropertyType, UpdatePropertyPayload,
        },
        permission::PermissionLevel,
    },
};

/// Código de referência da unidade: `APT-2610042` (prefixo do tipo, AAMM, 3 dígitos aleatórios).
pub fn reference_code<R: Rng + ?Sized>(property_type: PropertyType, now: DateTime<Utc>, rng: &mut R) -> String {
    format!(
        "{}-{}{:03}",
        property_type.reference_prefix(),
        now.format("%y%m"),
        rng.gen_range(0..1000)
    )
}

#[derive(Clone)]
pub struct PropertyService {
    pool: PgPool,
    holdings_repo: HoldingsRepository,
    audit_repo: AuditRepository,
    guard: AccessGuard,
    annotator: BulkPermissionAnnotator,
}

impl PropertyService {
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

    pub async fn create(&self, user: &User, payload: CreatePropertyPayload) -> Result<Property, AppError> {
        payload.validate()?;

        // 1. CREATE no prédio pai
        let building = self
            .guard
            .require_building(user, payload.building_id, PermissionLevel::Create)
            .await?;

        let code = reference_code(
            payload.property_type,
            self.guard.resolver().now(),
            &mut rand::thread_rng(),
        );

        // 2. Criação + auditoria
        let mut tx = self.pool.begin().await?;

        let property = self
            .holdings_repo
            .create_property(&mut *tx, building.workspace_id, &code, &payload)
            .await?;

        let entry = AuditEntry::new(user.id, AuditAction::Create, EntityType::Property, property.id)
            .with_new_values(snapshot(&property));
        self.audit_repo.record_in(&mut *tx, &entry).await?;

        tx.commit().await?;

        tracing::info!(property_id = %property.id, reference = %property.reference_code, "🏠 Unidade criada");
        Ok(property)
    }

    pub async fn get(&self, user: &User, property_id: Uuid) -> Result<PropertyWithBuilding, AppError> {
        self.guard
            .require_property(user, property_id, PermissionLevel::View)
            .await
    }

    pub async fn update(
        &self,
        user: &User,
        property_id: Uuid,
        payload: UpdatePropertyPayload,
    ) -> Result<Property, AppError> {
        payload.validate()?;

        let PropertyWithBuilding { property, .. } = self
            .guard
            .require_property(user, property_id, PermissionLevel::Update)
            .await?;

        let Some((old_values, new_values)) = field_changes(&property, &payload) else {
            return Ok(property);
        };

        let mut tx = self.pool.begin().await?;

        let updated = self
            .holdings_repo
            .update_property(&mut *tx, property_id, &payload)
            .await?;

        let entry = AuditEntry::new(user.id, AuditAction::Update, EntityType::Property, property_id)
            .with_old_values(old_values)
            .with_new_values(new_values);
        self.audit_repo.record_in(&mut *tx, &entry).await?;

        tx.commit().await?;
        Ok(updated)
    }

    pub async fn change_status(
        &self,
        user: &User,
        property_id: Uuid,
        status: PropertyStatus,
    ) -> Result<Property, AppError> {
        let PropertyWithBuilding { property, .. } = self
            .guard
            .require_property(user, property_id, PermissionLevel::Update)
            .await?;

        if property.status == status {
            return Ok(property);
        }

        let mut tx = self.pool.begin().await?;

        let updated = self
            .holdings_repo
            .set_property_status(&mut *tx, property_id, status)
            .await?;

        let entry = AuditEntry::new(user.id, AuditAction::Update, EntityType::Property, property_id)
            .with_old_values(serde_json::json!({ "status": property.status }))
            .with_new_values(serde_json::json!({ "status": status }));
        self.audit_repo.record_in(&mut *tx, &entry).await?;

        tx.commit().await?;
        Ok(updated)
    }

    pub async fn delete(&self, user: &User, property_id: Uuid) -> Result<(), AppError> {
        let PropertyWithBuilding { property, .. } = self
            .guard
            .require_property(user, property_id, PermissionLevel::Delete)
            .await?;

        if property.status == PropertyStatus::Occupied {
            return Err(AppError::BusinessRule(
                "Não é possível remover uma unidade ocupada. Encerre o contrato antes.".into(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        self.holdings_repo.soft_delete_property(&mut *tx, property_id).await?;

        let entry = AuditEntry::new(user.id, AuditAction::Delete, EntityType::Property, property_id)
            .with_old_values(snapshot(&property));
        self.audit_repo.record_in(&mut *tx, &entry).await?;

        tx.commit().await?;
        Ok(())
    }

    // Exige VIEW no prédio; todas as linhas herdam o mesmo nível
    pub async fn list_for_building(
        &self,
        user: &User,
        building_id: Uuid,
    ) -> Result<Vec<Annotated<Property>>, AppError> {
        self.guard
            .require_building(user, building_id, PermissionLevel::View)
            .await?;

        let properties = self
            .holdings_repo
            .list_properties_for_building(&self.pool, building_id)
            .await?;

        self.annotator.annotate(user, properties).await
    }

    /// Unidades do workspace visíveis ao usuário (pela concessão do prédio pai).
    pub async fn list_for_user(&self, user: &User) -> Result<Vec<Annotated<Property>>, AppError> {
        let properties = self
            .holdings_repo
            .list_properties_for_workspace(&self.pool, user.workspace_id)
            .await?;

        self.annotator.visible(user, properties).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn reference_code_has_prefix_year_month_and_three_digits() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        for (property_type, prefix) in [
            (PropertyType::Apartment, "APT-2610"),
            (PropertyType::House, "HSE-2610"),
            (PropertyType::Studio, "STD-2610"),
        ] {
            let code = reference_code(property_type, now, &mut rng);
            assert!(code.starts_with(prefix), "{code}");
            assert_eq!(code.len(), prefix.len() + 3);
            assert!(code[prefix.len()..].chars().all(|c| c.is_ascii_digit()));
        }
    }
}
