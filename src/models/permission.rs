// src/models/permission.rs

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Nível de permissão sobre um prédio.
///
/// A ordem de declaração É a hierarquia: `Delete > Update > Create > View`.
/// O `Ord` derivado é a única fonte de verdade para "mais forte que";
/// um nível mais alto implica todos os mais baixos no mesmo escopo.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "permission_level", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionLevel {
    View = 1,
    Create = 2,
    Update = 3,
    Delete = 4,
}

/// Nível efetivo de um usuário num escopo. `None` = sem acesso.
///
/// `Option<T: Ord>` já ordena `None` abaixo de qualquer `Some(_)`, então
/// "none(0) < VIEW(1) < ... < DELETE(4)" sai de graça.
pub type EffectiveLevel = Option<PermissionLevel>;

impl PermissionLevel {
    #[cfg(test)]
    pub const ALL: [PermissionLevel; 4] = [
        PermissionLevel::View,
        PermissionLevel::Create,
        PermissionLevel::Update,
        PermissionLevel::Delete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PermissionLevel::View => "VIEW",
            PermissionLevel::Create => "CREATE",
            PermissionLevel::Update => "UPDATE",
            PermissionLevel::Delete => "DELETE",
        }
    }
}

/// `true` se o nível efetivo cobre o nível exigido.
pub fn satisfies(effective: EffectiveLevel, required: PermissionLevel) -> bool {
    effective >= Some(required)
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serializa um `EffectiveLevel` como "VIEW".."DELETE" ou "NONE".
pub fn serialize_effective<S>(level: &EffectiveLevel, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(level.map_or("NONE", PermissionLevel::as_str))
}

// ---
// A concessão persistida (tabela user_building_permissions)
// ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionGrant {
    pub id: Uuid,
    pub user_id: Uuid,
    pub building_id: Uuid,
    pub level: PermissionLevel,
    pub granted_by: Option<Uuid>,
    pub granted_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing)]
    pub is_deleted: bool,
}

impl PermissionGrant {
    /// Válida sse não removida e (sem expiração OU expira em `now` ou depois).
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_deleted && self.expires_at.is_none_or(|expires_at| expires_at >= now)
    }
}

// Projeção mínima usada pelo resolvedor e pelo anotador
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct GrantLevel {
    pub building_id: Uuid,
    pub level: PermissionLevel,
}

// Payload para conceder acesso a um prédio
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrantPayload {
    pub user_id: Uuid,
    pub level: PermissionLevel,
    pub expires_at: Option<DateTime<Utc>>,
}

// Resumo de acesso (o "menu lateral" do front)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessSummary {
    #[serde(serialize_with = "serialize_effective")]
    #[schema(value_type = String, example = "UPDATE")]
    pub building_scope: EffectiveLevel,
    #[serde(serialize_with = "serialize_effective")]
    #[schema(value_type = String, example = "UPDATE")]
    pub property_scope: EffectiveLevel,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn grant(expires_at: Option<DateTime<Utc>>, is_deleted: bool) -> PermissionGrant {
        PermissionGrant {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            building_id: Uuid::new_v4(),
            level: PermissionLevel::View,
            granted_by: None,
            granted_at: Utc::now(),
            expires_at,
            is_deleted,
        }
    }

    #[test]
    fn levels_are_totally_ordered_strongest_last() {
        assert!(PermissionLevel::Delete > PermissionLevel::Update);
        assert!(PermissionLevel::Update > PermissionLevel::Create);
        assert!(PermissionLevel::Create > PermissionLevel::View);
        assert!(None < Some(PermissionLevel::View));
    }

    #[test]
    fn stronger_level_satisfies_every_weaker_requirement() {
        for held in PermissionLevel::ALL {
            for required in PermissionLevel::ALL {
                assert_eq!(satisfies(Some(held), required), held >= required);
            }
            assert!(!satisfies(None, held));
        }
    }

    #[test]
    fn payload_levels_use_wire_names() {
        let level: PermissionLevel = serde_json::from_str("\"UPDATE\"").unwrap();
        assert_eq!(level, PermissionLevel::Update);
        assert!(serde_json::from_str::<PermissionLevel>("\"can_view\"").is_err());
        assert_eq!(PermissionLevel::Delete.to_string(), "DELETE");
    }

    #[test]
    fn serializes_levels_and_none() {
        let summary = AccessSummary {
            building_scope: Some(PermissionLevel::Create),
            property_scope: None,
        };
        let json = serde_json::to_value(summary).unwrap();
        assert_eq!(json["buildingScope"], "CREATE");
        assert_eq!(json["propertyScope"], "NONE");
    }

    #[test]
    fn grant_validity_respects_expiry_boundary() {
        let now = Utc::now();
        assert!(grant(None, false).is_valid_at(now));
        assert!(grant(Some(now), false).is_valid_at(now));
        assert!(!grant(Some(now), false).is_valid_at(now + Duration::microseconds(1)));
        assert!(!grant(None, true).is_valid_at(now));
    }
}
