// src/models/audit.rs

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "audit_action", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    View,
    AccessDenied,
}

// Tipo da entidade afetada (gravado como texto: 'Building', 'Property'...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityType {
    Building,
    Property,
    Contract,
    Payment,
    Renter,
    User,
    Grant,
}

impl EntityType {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Building => "Building",
            EntityType::Property => "Property",
            EntityType::Contract => "Contract",
            EntityType::Payment => "Payment",
            EntityType::Renter => "Renter",
            EntityType::User => "User",
            EntityType::Grant => "Grant",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Um registro de auditoria.
///
/// `entity_id` é o UUID nulo (`Uuid::nil()`) quando não há id resolvível
/// (ex: tentativa de criação negada).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub action: AuditAction,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub old_values: Option<Value>,
    pub new_values: Option<Value>,
    pub action_date: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(actor_id: Uuid, action: AuditAction, entity_type: EntityType, entity_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            actor_id,
            action,
            entity_type,
            entity_id,
            old_values: None,
            new_values: None,
            action_date: Utc::now(),
        }
    }

    pub fn access_denied(actor_id: Uuid, entity_type: EntityType, entity_id: Option<Uuid>) -> Self {
        Self::new(
            actor_id,
            AuditAction::AccessDenied,
            entity_type,
            entity_id.unwrap_or_else(Uuid::nil),
        )
    }

    pub fn with_old_values(mut self, values: Value) -> Self {
        self.old_values = Some(values);
        self
    }

    pub fn with_new_values(mut self, values: Value) -> Self {
        self.new_values = Some(values);
        self
    }
}

/// Foto JSON de uma entidade para `old_values`/`new_values`.
pub fn snapshot<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Compara a entidade atual com um "patch" parcial e devolve `(antigos, novos)`
/// apenas dos campos presentes no patch. `None` se o patch estiver vazio.
///
/// As duas estruturas precisam serializar com os mesmos nomes de campo (camelCase).
pub fn field_changes<E, P>(entity: &E, patch: &P) -> Option<(Value, Value)>
where
    E: Serialize,
    P: Serialize,
{
    let new_values = match serde_json::to_value(patch).ok()? {
        Value::Object(map) if !map.is_empty() => map,
        _ => return None,
    };

    let current = match serde_json::to_value(entity).ok()? {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    let old_values: Map<String, Value> = new_values
        .keys()
        .map(|key| (key.clone(), current.get(key).cloned().unwrap_or(Value::Null)))
        .collect();

    Some((Value::Object(old_values), Value::Object(new_values)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Entity {
        name: String,
        floor_count: i32,
        city: String,
    }

    #[derive(Serialize, Default)]
    #[serde(rename_all = "camelCase")]
    struct Patch {
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        floor_count: Option<i32>,
    }

    fn entity() -> Entity {
        Entity {
            name: "Résidence Bastos".into(),
            floor_count: 4,
            city: "Yaoundé".into(),
        }
    }

    #[test]
    fn field_changes_only_reports_patched_fields() {
        let patch = Patch {
            floor_count: Some(6),
            ..Default::default()
        };

        let (old, new) = field_changes(&entity(), &patch).unwrap();
        assert_eq!(old, json!({ "floorCount": 4 }));
        assert_eq!(new, json!({ "floorCount": 6 }));
    }

    #[test]
    fn empty_patch_has_no_changes() {
        assert!(field_changes(&entity(), &Patch::default()).is_none());
    }

    #[test]
    fn denial_without_id_uses_nil_sentinel() {
        let actor = Uuid::new_v4();
        let entry = AuditEntry::access_denied(actor, EntityType::Building, None);
        assert_eq!(entry.action, AuditAction::AccessDenied);
        assert_eq!(entry.entity_id, Uuid::nil());
        assert_eq!(entry.actor_id, actor);
    }
}
