// src/models/holdings.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

// ---
// Validação Customizada
// ---
pub(crate) fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "property_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyType {
    Apartment,
    House,
    Studio,
}

impl PropertyType {
    /// Prefixo do código de referência (APT-2510123)
    pub fn reference_prefix(self) -> &'static str {
        match self {
            PropertyType::Apartment => "APT",
            PropertyType::House => "HSE",
            PropertyType::Studio => "STD",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "property_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyStatus {
    Available,
    Occupied,
    Maintenance,
    Unavailable,
}

// ---
// 1. Building (O "Prédio")
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub name: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub floor_count: i32,
    pub description: Option<String>,
    pub created_by: Option<Uuid>,

    #[serde(skip_serializing)]
    pub is_deleted: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// 2. Property (A "Unidade" / Imóvel)
// ---
// O prédio é opcional: a unidade pode existir solta, mas o caminho normal tem prédio.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub building_id: Option<Uuid>,
    pub reference_code: String,
    pub name: String,

    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub property_type: PropertyType,

    pub status: PropertyStatus,
    pub floor: Option<i32>,
    pub door_number: Option<String>,
    pub surface_area: f64,
    pub room_count: i32,
    pub bedroom_count: i32,
    pub bathroom_count: i32,
    pub has_parking: bool,
    pub has_balcony: bool,
    pub monthly_rent: Decimal,
    pub description: Option<String>,

    #[serde(skip_serializing)]
    pub is_deleted: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBuildingPayload {
    #[validate(length(min = 1, max = 255, message = "O nome é obrigatório."))]
    pub name: String,
    #[validate(length(min = 1, max = 500, message = "O endereço é obrigatório."))]
    pub street: String,
    #[validate(length(min = 1, max = 100, message = "A cidade é obrigatória."))]
    pub city: String,
    #[validate(length(min = 1, max = 20, message = "O código postal é obrigatório."))]
    pub postal_code: String,
    #[validate(length(min = 1, max = 100))]
    pub country: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[validate(range(min = 1, message = "O prédio deve ter pelo menos um andar."))]
    pub floor_count: i32,
    pub description: Option<String>,
}

// Só os campos presentes são alterados
#[derive(Debug, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBuildingPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 500))]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100))]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 20))]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100))]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1))]
    pub floor_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePropertyPayload {
    pub building_id: Uuid,

    #[validate(length(min = 1, max = 255, message = "O nome é obrigatório."))]
    pub name: String,

    #[serde(rename = "type")]
    pub property_type: PropertyType,

    pub floor: Option<i32>,

    #[validate(length(max = 20))]
    pub door_number: Option<String>,

    #[validate(range(min = 0.0, message = "A área não pode ser negativa."))]
    pub surface_area: f64,

    #[validate(range(min = 1, message = "A unidade deve ter pelo menos um cômodo."))]
    pub room_count: i32,

    #[validate(range(min = 0))]
    #[serde(default)]
    pub bedroom_count: i32,

    #[validate(range(min = 0))]
    #[serde(default = "default_bathroom_count")]
    pub bathroom_count: i32,

    #[serde(default)]
    pub has_parking: bool,

    #[serde(default)]
    pub has_balcony: bool,

    #[validate(custom(function = "validate_not_negative"))]
    pub monthly_rent: Decimal,

    pub description: Option<String>,
}

fn default_bathroom_count() -> i32 {
    1
}

#[derive(Debug, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePropertyPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 20))]
    pub door_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0))]
    pub surface_area: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1))]
    pub room_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0))]
    pub bedroom_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0))]
    pub bathroom_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_parking: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_balcony: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_not_negative"))]
    pub monthly_rent: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PropertyStatusPayload {
    pub status: PropertyStatus,
}
