// src/services/grant_service.rs

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    access::AccessGuard,
    common::error::AppError,
    db::{AuditRepository, GrantRepository, UserRepository},
    models::{
        audit::{snapshot, AuditAction, AuditEntry, EntityType},
        auth::User,
        permission::{GrantPayload, PermissionGrant, PermissionLevel},
    },
};

/// Expiração precisa estar no futuro (ou ausente = sem expiração).
pub fn ensure_future_expiry(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Result<(), AppError> {
    match expires_at {
        Some(expires_at) if expires_at <= now => Err(AppError::BusinessRule(
            "A data de expiração deve estar no futuro.".into(),
        )),
        _ => Ok(()),
    }
}

/// Auditoria de uma concessão: UPDATE quando substitui uma anterior do mesmo par
/// (com a anterior em `old_values`), CREATE quando é a primeira.
pub fn grant_audit_entry(
    actor_id: Uuid,
    previous: Option<&PermissionGrant>,
    grant: &PermissionGrant,
) -> AuditEntry {
    match previous {
        Some(previous) => AuditEntry::new(actor_id, AuditAction::Update, EntityType::Grant, grant.id)
            .with_old_values(snapshot(previous))
            .with_new_values(snapshot(grant)),
        None => AuditEntry::new(actor_id, AuditAction::Create, EntityType::Grant, grant.id)
            .with_new_values(snapshot(grant)),
    }
}

// Concessão e revogação de acesso a prédios. Exclusivo do OWNER.
#[derive(Clone)]
pub struct GrantService {
    pool: PgPool,
    grant_repo: GrantRepository,
    user_repo: UserRepository,
    audit_repo: AuditRepository,
    guard: AccessGuard,
}

impl GrantService {
    pub fn new(
        pool: PgPool,
        grant_repo: GrantRepository,
        user_repo: UserRepository,
        audit_repo: AuditRepository,
        guard: AccessGuard,
    ) -> Self {
        Self {
            pool,
            grant_repo,
            user_repo,
            audit_repo,
            guard,
        }
    }

    /// Concede (ou substitui) o acesso de `payload.user_id` ao prédio.
    ///
    /// A concessão anterior do par vira histórico (soft delete) e uma nova linha entra.
    pub async fn grant(
        &self,
        user: &User,
        building_id: Uuid,
        payload: GrantPayload,
    ) -> Result<PermissionGrant, AppError> {
        if !user.is_owner() {
            return self.guard.deny(user, EntityType::Building, Some(building_id)).await;
        }

        // 1. Prédio existe e é do workspace
        self.guard
            .require_building(user, building_id, PermissionLevel::Delete)
            .await?;

        // 2. Beneficiário do mesmo workspace e não-OWNER
        let target = match self.user_repo.find_by_id(&self.pool, payload.user_id).await? {
            Some(target) if target.workspace_id == user.workspace_id => target,
            _ => {
                return self
                    .guard
                    .deny(user, EntityType::User, Some(payload.user_id))
                    .await;
            }
        };
        if target.is_owner() {
            return Err(AppError::BusinessRule(
                "O OWNER já tem acesso total; não há o que conceder.".into(),
            ));
        }

        ensure_future_expiry(payload.expires_at, self.guard.resolver().now())?;

        // 3. Substituição + auditoria
        let mut tx = self.pool.begin().await?;

        let previous = self
            .grant_repo
            .soft_delete_active_for_pair(&mut *tx, target.id, building_id)
            .await?;

        let grant = self
            .grant_repo
            .create(&mut *tx, target.id, building_id, payload.level, user.id, payload.expires_at)
            .await?;

        let entry = grant_audit_entry(user.id, previous.as_ref(), &grant);
        self.audit_repo.record_in(&mut *tx, &entry).await?;

        tx.commit().await?;

        tracing::info!(
            user_id = %target.id,
            building_id = %building_id,
            level = %grant.level,
            replaced = previous.is_some(),
            "🔑 Acesso concedido"
        );
        Ok(grant)
    }

    pub async fn revoke(&self, user: &User, grant_id: Uuid) -> Result<(), AppError> {
        if !user.is_owner() {
            return self.guard.deny(user, EntityType::Grant, Some(grant_id)).await;
        }

        let Some(grant) = self.grant_repo.find_active_by_id(&self.pool, grant_id).await? else {
            return self.guard.deny(user, EntityType::Grant, Some(grant_id)).await;
        };

        // O prédio da concessão precisa ser do workspace do OWNER
        self.guard
            .require_building(user, grant.building_id, PermissionLevel::Delete)
            .await?;

        let mut tx = self.pool.begin().await?;

        self.grant_repo.soft_delete(&mut *tx, grant_id).await?;

        let entry = AuditEntry::new(user.id, AuditAction::Delete, EntityType::Grant, grant_id)
            .with_old_values(snapshot(&grant));
        self.audit_repo.record_in(&mut *tx, &entry).await?;

        tx.commit().await?;

        tracing::info!(grant_id = %grant_id, "🔒 Acesso revogado");
        Ok(())
    }

    pub async fn list_for_building(&self, user: &User, building_id: Uuid) -> Result<Vec<PermissionGrant>, AppError> {
        if !user.is_owner() {
            return self.guard.deny(user, EntityType::Building, Some(building_id)).await;
        }

        self.guard
            .require_building(user, building_id, PermissionLevel::View)
            .await?;

        self.grant_repo
            .list_valid_for_building(&self.pool, building_id, self.guard.resolver().now())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn expiry_must_be_strictly_in_the_future() {
        let now = Utc::now();

        assert!(ensure_future_expiry(None, now).is_ok());
        assert!(ensure_future_expiry(Some(now + Duration::seconds(1)), now).is_ok());
        assert!(matches!(
            ensure_future_expiry(Some(now), now),
            Err(AppError::BusinessRule(_))
        ));
        assert!(ensure_future_expiry(Some(now - Duration::days(1)), now).is_err());
    }

    fn grant_row(level: PermissionLevel, user_id: Uuid, building_id: Uuid) -> PermissionGrant {
        PermissionGrant {
            id: Uuid::new_v4(),
            user_id,
            building_id,
            level,
            granted_by: None,
            granted_at: Utc::now(),
            expires_at: None,
            is_deleted: false,
        }
    }

    #[test]
    fn replacing_a_grant_is_audited_as_update() {
        let (owner, user, building) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let previous = grant_row(PermissionLevel::View, user, building);
        let grant = grant_row(PermissionLevel::Update, user, building);

        let entry = grant_audit_entry(owner, Some(&previous), &grant);

        assert_eq!(entry.action, AuditAction::Update);
        assert_eq!(entry.entity_type, EntityType::Grant);
        assert_eq!(entry.entity_id, grant.id);
        assert_eq!(entry.actor_id, owner);
        assert_eq!(entry.old_values.unwrap()["level"], "VIEW");
        assert_eq!(entry.new_values.unwrap()["level"], "UPDATE");
    }

    #[test]
    fn first_grant_is_audited_as_create() {
        let grant = grant_row(PermissionLevel::Create, Uuid::new_v4(), Uuid::new_v4());

        let entry = grant_audit_entry(Uuid::new_v4(), None, &grant);

        assert_eq!(entry.action, AuditAction::Create);
        assert!(entry.old_values.is_none());
        assert_eq!(entry.new_values.unwrap()["id"], grant.id.to_string());
    }
}
