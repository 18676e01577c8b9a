// src/services/team_service.rs

use bcrypt::hash;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    access::AccessGuard,
    common::error::AppError,
    db::{AuditRepository, UserRepository},
    models::{
        audit::{field_changes, snapshot, AuditAction, AuditEntry, EntityType},
        auth::{CreateMemberPayload, UpdateMemberPayload, User, UserRole},
    },
};

// Gestão da equipe do workspace. Tudo aqui é exclusivo do OWNER (exceto ver o próprio perfil).
#[derive(Clone)]
pub struct TeamService {
    pool: PgPool,
    user_repo: UserRepository,
    audit_repo: AuditRepository,
    guard: AccessGuard,
}

impl TeamService {
    pub fn new(pool: PgPool, user_repo: UserRepository, audit_repo: AuditRepository, guard: AccessGuard) -> Self {
        Self {
            pool,
            user_repo,
            audit_repo,
            guard,
        }
    }

    async fn member_for(&self, user: &User, member_id: Uuid) -> Result<User, AppError> {
        match self.user_repo.find_by_id(&self.pool, member_id).await? {
            Some(member) if member.workspace_id == user.workspace_id => Ok(member),
            _ => self.guard.deny(user, EntityType::User, Some(member_id)).await,
        }
    }

    pub async fn create_member(&self, user: &User, payload: CreateMemberPayload) -> Result<User, AppError> {
        payload.validate()?;

        if !user.is_owner() {
            return self.guard.deny(user, EntityType::User, None).await;
        }
        ensure_not_owner_role(payload.role)?;

        // 1. Hashing fora da transação (é CPU, não banco)
        let password = payload.password.clone();
        let password_hash = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        // 2. Criação + auditoria
        let mut tx = self.pool.begin().await?;

        let member = self
            .user_repo
            .create_member(&mut *tx, user.workspace_id, user.id, &payload, &password_hash)
            .await?;

        let entry = AuditEntry::new(user.id, AuditAction::Create, EntityType::User, member.id)
            .with_new_values(snapshot(&member));
        self.audit_repo.record_in(&mut *tx, &entry).await?;

        tx.commit().await?;

        tracing::info!(member_id = %member.id, role = ?member.role, "👤 Membro da equipe criado");
        Ok(member)
    }

    pub async fn update_member(
        &self,
        user: &User,
        member_id: Uuid,
        payload: UpdateMemberPayload,
    ) -> Result<User, AppError> {
        payload.validate()?;

        if !user.is_owner() {
            return self.guard.deny(user, EntityType::User, Some(member_id)).await;
        }

        let member = self.member_for(user, member_id).await?;

        if member.is_owner() {
            return Err(AppError::BusinessRule(
                "O OWNER do workspace não pode ser alterado por aqui.".into(),
            ));
        }
        if let Some(role) = payload.role {
            ensure_not_owner_role(role)?;
        }

        let Some((old_values, new_values)) = field_changes(&member, &payload) else {
            return Ok(member);
        };

        let mut tx = self.pool.begin().await?;

        let updated = self.user_repo.update_member(&mut *tx, member_id, &payload).await?;

        let entry = AuditEntry::new(user.id, AuditAction::Update, EntityType::User, member_id)
            .with_old_values(old_values)
            .with_new_values(new_values);
        self.audit_repo.record_in(&mut *tx, &entry).await?;

        tx.commit().await?;
        Ok(updated)
    }

    pub async fn list_members(&self, user: &User) -> Result<Vec<User>, AppError> {
        if !user.is_owner() {
            return self.guard.deny(user, EntityType::User, None).await;
        }

        let members = self
            .user_repo
            .list_by_workspace(&self.pool, user.workspace_id)
            .await?;

        Ok(members.into_iter().filter(|m| !m.is_owner()).collect())
    }

    // O OWNER vê qualquer membro; os demais, só a si mesmos
    pub async fn get_member(&self, user: &User, member_id: Uuid) -> Result<User, AppError> {
        if !user.is_owner() && user.id != member_id {
            return self.guard.deny(user, EntityType::User, Some(member_id)).await;
        }

        self.member_for(user, member_id).await
    }
}

fn ensure_not_owner_role(role: UserRole) -> Result<(), AppError> {
    if role == UserRole::Owner {
        return Err(AppError::BusinessRule(
            "Um workspace tem um único OWNER; escolha MANAGER ou VIEWER.".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_manager_and_viewer_can_be_assigned() {
        assert!(ensure_not_owner_role(UserRole::Manager).is_ok());
        assert!(ensure_not_owner_role(UserRole::Viewer).is_ok());
        assert!(matches!(
            ensure_not_owner_role(UserRole::Owner),
            Err(AppError::BusinessRule(_))
        ));
    }
}
