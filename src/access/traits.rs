// src/access/traits.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        audit::AuditEntry,
        holdings::{Building, Property},
        permission::{GrantLevel, PermissionLevel},
    },
};

/// Leitura das concessões (grants) válidas.
///
/// "Válida" = não removida e `expires_at IS NULL OR expires_at >= now`.
/// O `now` vem de quem chama, para que a consulta unitária e a em lote
/// usem exatamente o mesmo instante de referência.
#[async_trait]
pub trait GrantStore: Send + Sync {
    async fn valid_grants_for_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<GrantLevel>, AppError>;

    async fn valid_grants_for_user_and_building(
        &self,
        user_id: Uuid,
        building_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<PermissionLevel>, AppError>;
}

/// Unidade + prédio pai (quando existe e não foi removido).
#[derive(Debug, Clone)]
pub struct PropertyWithBuilding {
    pub property: Property,
    pub building: Option<Building>,
}

/// Busca das entidades que servem de escopo. Linhas com soft delete nunca voltam.
#[async_trait]
pub trait ScopeLookup: Send + Sync {
    async fn find_building_by_id(&self, building_id: Uuid) -> Result<Option<Building>, AppError>;

    async fn find_property_with_parent_building_by_id(
        &self,
        property_id: Uuid,
    ) -> Result<Option<PropertyWithBuilding>, AppError>;
}

/// Destino dos registros de auditoria.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: AuditEntry) -> Result<(), AppError>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
