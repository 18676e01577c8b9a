// src/access/annotator.rs

use serde::Serialize;
use uuid::Uuid;

use crate::{
    access::resolver::ScopeResolver,
    common::error::AppError,
    models::{
        auth::User,
        finance::{ContractListing, PaymentListing},
        holdings::{Building, Property},
        permission::{serialize_effective, AccessSummary, EffectiveLevel},
    },
};

/// Linha de listagem que sabe em qual prédio sua permissão é avaliada.
pub trait ScopedRow {
    fn scope_building_id(&self) -> Option<Uuid>;
}

impl ScopedRow for Building {
    fn scope_building_id(&self) -> Option<Uuid> {
        Some(self.id)
    }
}

// Unidade herda do prédio pai
impl ScopedRow for Property {
    fn scope_building_id(&self) -> Option<Uuid> {
        self.building_id
    }
}

// Contratos e pagamentos: prédio da unidade alugada (vem do JOIN)
impl ScopedRow for ContractListing {
    fn scope_building_id(&self) -> Option<Uuid> {
        self.building_id
    }
}

impl ScopedRow for PaymentListing {
    fn scope_building_id(&self) -> Option<Uuid> {
        self.building_id
    }
}

/// Uma linha com o nível efetivo do usuário anexado (`"effectiveLevel": "UPDATE"`).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotated<T> {
    #[serde(flatten)]
    pub row: T,
    #[serde(serialize_with = "serialize_effective")]
    pub effective_level: EffectiveLevel,
}

/// Anota listagens com o nível efetivo por linha usando UMA consulta de concessões.
#[derive(Clone)]
pub struct BulkPermissionAnnotator {
    resolver: ScopeResolver,
}

impl BulkPermissionAnnotator {
    pub fn new(resolver: ScopeResolver) -> Self {
        Self { resolver }
    }

    pub async fn annotate<T: ScopedRow>(
        &self,
        user: &User,
        rows: Vec<T>,
    ) -> Result<Vec<Annotated<T>>, AppError> {
        // 1. OWNER: DELETE em tudo, sem consulta
        if let Some(level) = ScopeResolver::role_override(user) {
            return Ok(rows
                .into_iter()
                .map(|row| Annotated {
                    row,
                    effective_level: level,
                })
                .collect());
        }

        // 2. Uma única consulta com todas as concessões válidas do usuário
        let grants = self
            .resolver
            .grants()
            .valid_grants_for_user(user.id, self.resolver.now())
            .await?;

        // 3. Mapa prédio -> melhor nível
        let best = ScopeResolver::best_levels_by_building(&grants);

        tracing::debug!(
            user_id = %user.id,
            rows = rows.len(),
            buildings_with_grants = best.len(),
            "anotando listagem"
        );

        // 4. Busca por linha; sem prédio ou sem concessão = sem acesso
        Ok(rows
            .into_iter()
            .map(|row| {
                let effective_level = row
                    .scope_building_id()
                    .and_then(|building_id| best.get(&building_id).copied());
                Annotated {
                    row,
                    effective_level,
                }
            })
            .collect())
    }

    /// Anota e descarta as linhas sem nível efetivo: o que as listagens devolvem.
    pub async fn visible<T: ScopedRow>(
        &self,
        user: &User,
        rows: Vec<T>,
    ) -> Result<Vec<Annotated<T>>, AppError> {
        let mut annotated = self.annotate(user, rows).await?;
        annotated.retain(|row| row.effective_level.is_some());
        Ok(annotated)
    }

    /// Nível mais forte que o usuário tem em qualquer prédio (OWNER = DELETE).
    pub async fn strongest_level(&self, user: &User) -> Result<EffectiveLevel, AppError> {
        if let Some(level) = ScopeResolver::role_override(user) {
            return Ok(level);
        }

        let grants = self
            .resolver
            .grants()
            .valid_grants_for_user(user.id, self.resolver.now())
            .await?;

        Ok(grants.into_iter().map(|g| g.level).max())
    }

    /// Resumo para o front decidir quais seções mostrar.
    ///
    /// Unidades herdam dos prédios, então os dois escopos saem do mesmo nível.
    pub async fn summary(&self, user: &User) -> Result<AccessSummary, AppError> {
        let level = self.strongest_level(user).await?;
        Ok(AccessSummary {
            building_scope: level,
            property_scope: level,
        })
    }
}
