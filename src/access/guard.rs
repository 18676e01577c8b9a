// src/access/guard.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    access::{
        resolver::ScopeResolver,
        traits::{AuditSink, PropertyWithBuilding, ScopeLookup},
    },
    common::error::AppError,
    models::{
        audit::{AuditEntry, EntityType},
        auth::User,
        holdings::{Building, Property},
        permission::{satisfies, EffectiveLevel, PermissionLevel},
    },
};

/// O que está sendo acessado: um prédio ou uma unidade (que herda do prédio pai).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeRef {
    Building(Uuid),
    Property(Uuid),
}

impl ScopeRef {
    pub fn entity_type(self) -> EntityType {
        match self {
            ScopeRef::Building(_) => EntityType::Building,
            ScopeRef::Property(_) => EntityType::Property,
        }
    }

    pub fn id(self) -> Uuid {
        match self {
            ScopeRef::Building(id) | ScopeRef::Property(id) => id,
        }
    }
}

/// A entidade carregada após uma autorização bem-sucedida.
#[derive(Debug, Clone)]
pub enum Scope {
    Building(Building),
    Property {
        property: Property,
        building: Option<Building>,
    },
}

impl Scope {
    /// O prédio contra o qual a permissão foi avaliada.
    pub fn building_id(&self) -> Option<Uuid> {
        match self {
            Scope::Building(building) => Some(building.id),
            Scope::Property { property, .. } => property.building_id,
        }
    }
}

// Motivo interno da negação. Nunca sai do guardião: para fora tudo vira `AccessDenied`.
#[derive(Debug)]
enum Denial {
    NotFound,
    InvalidScope,
    Insufficient {
        effective: EffectiveLevel,
        required: PermissionLevel,
    },
}

/// Ponto único de autorização dos serviços.
///
/// Não escreve nada além do registro de auditoria de uma negação.
#[derive(Clone)]
pub struct AccessGuard {
    lookup: Arc<dyn ScopeLookup>,
    resolver: ScopeResolver,
    audit: Arc<dyn AuditSink>,
}

impl AccessGuard {
    pub fn new(lookup: Arc<dyn ScopeLookup>, resolver: ScopeResolver, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            lookup,
            resolver,
            audit,
        }
    }

    pub fn resolver(&self) -> &ScopeResolver {
        &self.resolver
    }

    /// Exige `required` sobre o escopo e devolve a entidade carregada.
    ///
    /// Inexistente, removida, de outro workspace ou com nível insuficiente:
    /// exatamente um registro `ACCESS_DENIED` e `AppError::AccessDenied`.
    /// Falhas de banco sobem intactas, sem auditoria de negação.
    pub async fn require_access(
        &self,
        user: &User,
        scope: ScopeRef,
        required: PermissionLevel,
    ) -> Result<Scope, AppError> {
        match scope {
            ScopeRef::Building(id) => self
                .require_building(user, id, required)
                .await
                .map(Scope::Building),
            ScopeRef::Property(id) => self
                .require_property(user, id, required)
                .await
                .map(|PropertyWithBuilding { property, building }| Scope::Property {
                    property,
                    building,
                }),
        }
    }

    pub async fn require_building(
        &self,
        user: &User,
        building_id: Uuid,
        required: PermissionLevel,
    ) -> Result<Building, AppError> {
        match self.evaluate_building(user, building_id, required).await? {
            Ok(building) => Ok(building),
            Err(denial) => self.reject(user, ScopeRef::Building(building_id), denial).await,
        }
    }

    pub async fn require_property(
        &self,
        user: &User,
        property_id: Uuid,
        required: PermissionLevel,
    ) -> Result<PropertyWithBuilding, AppError> {
        match self.evaluate_property(user, property_id, required).await? {
            Ok(loaded) => Ok(loaded),
            Err(denial) => self.reject(user, ScopeRef::Property(property_id), denial).await,
        }
    }

    /// Caminho de negação compartilhado: loga, audita uma vez e devolve o erro genérico.
    ///
    /// Os serviços usam direto quando negam antes de chegar a um escopo
    /// (contrato de outro workspace, ação exclusiva do OWNER...).
    pub async fn deny<T>(
        &self,
        user: &User,
        entity_type: EntityType,
        entity_id: Option<Uuid>,
    ) -> Result<T, AppError> {
        tracing::warn!(
            user_id = %user.id,
            entity = %entity_type,
            entity_id = ?entity_id,
            "🚫 Acesso negado"
        );

        self.audit
            .record(AuditEntry::access_denied(user.id, entity_type, entity_id))
            .await?;

        Err(AppError::AccessDenied)
    }

    async fn reject<T>(&self, user: &User, scope: ScopeRef, denial: Denial) -> Result<T, AppError> {
        tracing::debug!(
            user_id = %user.id,
            entity = %scope.entity_type(),
            entity_id = %scope.id(),
            reason = ?denial,
            "motivo interno da negação"
        );
        self.deny(user, scope.entity_type(), Some(scope.id())).await
    }

    async fn evaluate_building(
        &self,
        user: &User,
        building_id: Uuid,
        required: PermissionLevel,
    ) -> Result<Result<Building, Denial>, AppError> {
        // 1. Carrega o prédio
        let Some(building) = self.lookup.find_building_by_id(building_id).await? else {
            return Ok(Err(Denial::NotFound));
        };

        // 2. Isolamento entre workspaces (conta como "não encontrado" para fora)
        if building.workspace_id != user.workspace_id {
            return Ok(Err(Denial::InvalidScope));
        }

        // 3. Nível efetivo no próprio prédio
        let checked = self.check_level(user, Some(building.id), required).await?;
        Ok(checked.map(|()| building))
    }

    async fn evaluate_property(
        &self,
        user: &User,
        property_id: Uuid,
        required: PermissionLevel,
    ) -> Result<Result<PropertyWithBuilding, Denial>, AppError> {
        // 1. Carrega a unidade junto com o prédio pai
        let Some(PropertyWithBuilding { property, building }) = self
            .lookup
            .find_property_with_parent_building_by_id(property_id)
            .await?
        else {
            return Ok(Err(Denial::NotFound));
        };

        // Prédio pai referenciado mas removido: a unidade fica inacessível
        if property.building_id.is_some() && building.is_none() {
            return Ok(Err(Denial::NotFound));
        }

        // 2. Isolamento entre workspaces, na unidade e no prédio pai
        let foreign_building = building
            .as_ref()
            .is_some_and(|b| b.workspace_id != user.workspace_id);
        if property.workspace_id != user.workspace_id || foreign_building {
            return Ok(Err(Denial::InvalidScope));
        }

        // 3. Cascata prédio → unidade: vale o nível no prédio pai
        let checked = self.check_level(user, property.building_id, required).await?;
        Ok(checked.map(|()| PropertyWithBuilding { property, building }))
    }

    // Comparação pela ordem total dos níveis
    async fn check_level(
        &self,
        user: &User,
        building_id: Option<Uuid>,
        required: PermissionLevel,
    ) -> Result<Result<(), Denial>, AppError> {
        let effective = self.resolver.resolve_scope(user, building_id).await?;
        if satisfies(effective, required) {
            Ok(Ok(()))
        } else {
            Ok(Err(Denial::Insufficient { effective, required }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::testing::Fixture;
    use crate::models::audit::AuditAction;
    use chrono::Duration;

    #[tokio::test]
    async fn owner_passes_every_level() {
        let fx = Fixture::new();
        let owner = fx.owner();
        let building = fx.add_building();
        let guard = fx.guard();

        for level in PermissionLevel::ALL {
            let scope = guard
                .require_access(&owner, ScopeRef::Building(building.id), level)
                .await
                .unwrap();
            assert_eq!(scope.building_id(), Some(building.id));
        }
        assert_eq!(fx.audit.count(), 0);
    }

    #[tokio::test]
    async fn non_owner_without_grant_cannot_view() {
        let fx = Fixture::new();
        let viewer = fx.viewer();
        let building = fx.add_building();

        let result = fx
            .guard()
            .require_access(&viewer, ScopeRef::Building(building.id), PermissionLevel::View)
            .await;

        assert!(matches!(result, Err(AppError::AccessDenied)));
        assert_eq!(fx.audit.count(), 1);
    }

    #[tokio::test]
    async fn grant_is_monotonic_over_required_levels() {
        for granted in PermissionLevel::ALL {
            let fx = Fixture::new();
            let manager = fx.manager();
            let building = fx.add_building();
            fx.store.grant(manager.id, building.id, granted, None);
            let guard = fx.guard();

            for required in PermissionLevel::ALL {
                let result = guard
                    .require_access(&manager, ScopeRef::Building(building.id), required)
                    .await;
                assert_eq!(result.is_ok(), required <= granted, "{granted} vs {required}");
            }
        }
    }

    #[tokio::test]
    async fn building_grant_cascades_to_its_properties() {
        let fx = Fixture::new();
        let user = fx.manager();
        let b1 = fx.add_building();
        let p1 = fx.add_property(Some(b1.id));
        let future = fx.clock.0 + Duration::days(30);
        fx.store.grant(user.id, b1.id, PermissionLevel::View, Some(future));
        let guard = fx.guard();

        let viewed = guard
            .require_property(&user, p1.id, PermissionLevel::View)
            .await
            .unwrap();
        assert_eq!(viewed.property.id, p1.id);
        assert_eq!(viewed.building.map(|b| b.id), Some(b1.id));

        let update = guard.require_property(&user, p1.id, PermissionLevel::Update).await;
        assert!(matches!(update, Err(AppError::AccessDenied)));

        let entries = fx.audit.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].entity_type, EntityType::Property);
        assert_eq!(entries[0].entity_id, p1.id);
    }

    #[tokio::test]
    async fn expired_grant_denies_and_audits_the_building() {
        let fx = Fixture::new();
        let user = fx.manager();
        let b1 = fx.add_building();
        fx.store.grant(
            user.id,
            b1.id,
            PermissionLevel::Create,
            Some(fx.clock.0 - Duration::seconds(1)),
        );

        assert_eq!(fx.resolver().resolve(&user, b1.id).await.unwrap(), None);

        let result = fx
            .guard()
            .require_access(&user, ScopeRef::Building(b1.id), PermissionLevel::View)
            .await;

        assert!(matches!(result, Err(AppError::AccessDenied)));
        let entries = fx.audit.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::AccessDenied);
        assert_eq!(entries[0].entity_type, EntityType::Building);
        assert_eq!(entries[0].entity_id, b1.id);
        assert_eq!(entries[0].actor_id, user.id);
    }

    #[tokio::test]
    async fn missing_entity_is_indistinguishable_from_denial() {
        let fx = Fixture::new();
        let owner = fx.owner();
        let missing = Uuid::new_v4();

        let result = fx
            .guard()
            .require_access(&owner, ScopeRef::Building(missing), PermissionLevel::View)
            .await;

        assert!(matches!(result, Err(AppError::AccessDenied)));
        let entries = fx.audit.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::AccessDenied);
        assert_eq!(entries[0].entity_id, missing);
    }

    #[tokio::test]
    async fn soft_deleted_entities_are_denied() {
        let fx = Fixture::new();
        let owner = fx.owner();
        let building = fx.add_building();
        let property = fx.add_property(Some(building.id));
        let guard = fx.guard();

        fx.store.soft_delete_property(property.id);
        let result = guard.require_property(&owner, property.id, PermissionLevel::View).await;
        assert!(matches!(result, Err(AppError::AccessDenied)));

        fx.store.soft_delete_building(building.id);
        let result = guard.require_building(&owner, building.id, PermissionLevel::View).await;
        assert!(matches!(result, Err(AppError::AccessDenied)));

        assert_eq!(fx.audit.count(), 2);
    }

    #[tokio::test]
    async fn property_of_removed_building_is_denied() {
        let fx = Fixture::new();
        let owner = fx.owner();
        let building = fx.add_building();
        let property = fx.add_property(Some(building.id));
        fx.store.soft_delete_building(building.id);

        let result = fx
            .guard()
            .require_property(&owner, property.id, PermissionLevel::View)
            .await;

        assert!(matches!(result, Err(AppError::AccessDenied)));
    }

    #[tokio::test]
    async fn other_workspace_is_denied_even_for_owner() {
        let fx = Fixture::new();
        let owner = fx.owner();
        let foreign = fx.building_in(Uuid::new_v4());

        let result = fx
            .guard()
            .require_access(&owner, ScopeRef::Building(foreign.id), PermissionLevel::View)
            .await;

        assert!(matches!(result, Err(AppError::AccessDenied)));
        assert_eq!(fx.audit.count(), 1);
    }

    #[tokio::test]
    async fn property_under_foreign_building_is_denied() {
        let fx = Fixture::new();
        let owner = fx.owner();
        let foreign = fx.building_in(Uuid::new_v4());
        let property = fx.add_property(Some(foreign.id));

        let result = fx
            .guard()
            .require_property(&owner, property.id, PermissionLevel::View)
            .await;

        assert!(matches!(result, Err(AppError::AccessDenied)));
        let entries = fx.audit.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].entity_type, EntityType::Property);
        assert_eq!(entries[0].entity_id, property.id);
    }

    #[tokio::test]
    async fn require_access_loads_the_matching_scope() {
        let fx = Fixture::new();
        let owner = fx.owner();
        let building = fx.add_building();
        let property = fx.add_property(Some(building.id));
        let guard = fx.guard();

        match guard
            .require_access(&owner, ScopeRef::Property(property.id), PermissionLevel::View)
            .await
            .unwrap()
        {
            Scope::Property { property: loaded, building: parent } => {
                assert_eq!(loaded.id, property.id);
                assert_eq!(parent.map(|b| b.id), Some(building.id));
            }
            other => panic!("escopo inesperado: {other:?}"),
        }

        let loaded = guard
            .require_building(&owner, building.id, PermissionLevel::Delete)
            .await
            .unwrap();
        assert_eq!(loaded.id, building.id);
    }

    #[tokio::test]
    async fn property_without_building_only_opens_to_owner() {
        let fx = Fixture::new();
        let orphan = fx.add_property(None);
        let guard = fx.guard();

        let owner = guard
            .require_property(&fx.owner(), orphan.id, PermissionLevel::Delete)
            .await;
        assert!(owner.is_ok());

        let manager = guard
            .require_property(&fx.manager(), orphan.id, PermissionLevel::View)
            .await;
        assert!(matches!(manager, Err(AppError::AccessDenied)));
    }

    #[tokio::test]
    async fn repeated_denials_are_each_audited() {
        let fx = Fixture::new();
        let viewer = fx.viewer();
        let building = fx.add_building();
        let guard = fx.guard();

        for _ in 0..2 {
            let result = guard
                .require_access(&viewer, ScopeRef::Building(building.id), PermissionLevel::Update)
                .await;
            assert!(matches!(result, Err(AppError::AccessDenied)));
        }

        assert_eq!(fx.audit.count(), 2);
    }

    #[tokio::test]
    async fn repeated_success_is_stable() {
        let fx = Fixture::new();
        let manager = fx.manager();
        let building = fx.add_building();
        fx.store.grant(manager.id, building.id, PermissionLevel::Update, None);
        let guard = fx.guard();

        for _ in 0..2 {
            let result = guard
                .require_building(&manager, building.id, PermissionLevel::Update)
                .await;
            assert!(result.is_ok());
        }
        assert_eq!(fx.audit.count(), 0);
    }

    #[tokio::test]
    async fn storage_failure_is_not_a_denial() {
        let fx = Fixture::new();
        let manager = fx.manager();
        let building = fx.add_building();
        fx.store.fail_next_query();

        let result = fx
            .guard()
            .require_access(&manager, ScopeRef::Building(building.id), PermissionLevel::View)
            .await;

        assert!(matches!(result, Err(AppError::DatabaseError(_))));
        assert_eq!(fx.audit.count(), 0);
    }

    #[tokio::test]
    async fn explicit_deny_uses_nil_sentinel_without_id() {
        let fx = Fixture::new();
        let viewer = fx.viewer();

        let result: Result<(), AppError> = fx.guard().deny(&viewer, EntityType::Building, None).await;

        assert!(matches!(result, Err(AppError::AccessDenied)));
        assert_eq!(fx.audit.entries()[0].entity_id, Uuid::nil());
    }
}
