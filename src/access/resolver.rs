// src/access/resolver.rs

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    access::traits::{Clock, GrantStore},
    common::error::AppError,
    models::{
        auth::{User, UserRole},
        permission::{EffectiveLevel, GrantLevel, PermissionLevel},
    },
};

/// Calcula o nível efetivo de um usuário sobre um prédio.
///
/// É o único lugar que conhece a regra "OWNER vê tudo": o guardião e o
/// anotador em lote passam por aqui.
#[derive(Clone)]
pub struct ScopeResolver {
    grants: Arc<dyn GrantStore>,
    clock: Arc<dyn Clock>,
}

impl ScopeResolver {
    pub fn new(grants: Arc<dyn GrantStore>, clock: Arc<dyn Clock>) -> Self {
        Self { grants, clock }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub(crate) fn grants(&self) -> &Arc<dyn GrantStore> {
        &self.grants
    }

    /// Nível imposto pelo papel, sem olhar concessões. `None` = consultar as concessões.
    pub fn role_override(user: &User) -> Option<EffectiveLevel> {
        match user.role {
            UserRole::Owner => Some(Some(PermissionLevel::Delete)),
            UserRole::Manager | UserRole::Viewer => None,
        }
    }

    /// Nível efetivo de `user` sobre o prédio `building_id`.
    ///
    /// O prédio precisa existir: quem chama (o guardião) já o carregou.
    pub async fn resolve(&self, user: &User, building_id: Uuid) -> Result<EffectiveLevel, AppError> {
        // 1. Papel primeiro: o OWNER nem chega a consultar a tabela
        if let Some(level) = Self::role_override(user) {
            return Ok(level);
        }

        // 2. Concessões válidas para o par (usuário, prédio)
        let levels = self
            .grants
            .valid_grants_for_user_and_building(user.id, building_id, self.now())
            .await?;

        // 3. A mais forte vence (None se não houver nenhuma)
        let effective = levels.into_iter().max();

        tracing::debug!(
            user_id = %user.id,
            building_id = %building_id,
            level = ?effective,
            "nível efetivo resolvido"
        );

        Ok(effective)
    }

    /// Variante para escopos que podem não ter prédio (unidade sem prédio pai).
    ///
    /// Sem prédio não há concessão possível: só o papel decide.
    pub async fn resolve_scope(
        &self,
        user: &User,
        building_id: Option<Uuid>,
    ) -> Result<EffectiveLevel, AppError> {
        match building_id {
            Some(building_id) => self.resolve(user, building_id).await,
            None => Ok(Self::role_override(user).unwrap_or(None)),
        }
    }

    /// Melhor nível por prédio, a partir de uma lista de concessões (várias linhas por prédio são aceitas).
    pub fn best_levels_by_building(grants: &[GrantLevel]) -> HashMap<Uuid, PermissionLevel> {
        let mut best: HashMap<Uuid, PermissionLevel> = HashMap::with_capacity(grants.len());
        for grant in grants {
            best.entry(grant.building_id)
                .and_modify(|level| *level = (*level).max(grant.level))
                .or_insert(grant.level);
        }
        best
    }
}
