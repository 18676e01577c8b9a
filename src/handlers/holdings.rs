// src/handlers/holdings.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    access::{Annotated, PropertyWithBuilding},
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::holdings::{
        Building, CreateBuildingPayload, CreatePropertyPayload, Property, PropertyStatusPayload,
        UpdateBuildingPayload, UpdatePropertyPayload,
    },
};

// =============================================================================
//  PRÉDIOS
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/buildings",
    tag = "Buildings",
    request_body = CreateBuildingPayload,
    responses(
        (status = 201, description = "Prédio criado", body = Building),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Acesso negado ou recurso não encontrado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn create_building(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateBuildingPayload>,
) -> Result<impl IntoResponse, AppError> {
    let building = app_state.building_service.create(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(building)))
}

#[utoipa::path(
    get,
    path = "/api/buildings",
    tag = "Buildings",
    responses(
        (status = 200, description = "Prédios visíveis, cada um com effectiveLevel", body = Vec<Building>)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn list_buildings(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<Annotated<Building>>>, AppError> {
    let buildings = app_state.building_service.list_for_user(&user).await?;
    Ok(Json(buildings))
}

#[utoipa::path(
    get,
    path = "/api/buildings/{id}",
    tag = "Buildings",
    responses(
        (status = 200, description = "Prédio", body = Building),
        (status = 403, description = "Acesso negado ou recurso não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do prédio")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_building(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(building_id): Path<Uuid>,
) -> Result<Json<Building>, AppError> {
    let building = app_state.building_service.get(&user, building_id).await?;
    Ok(Json(building))
}

#[utoipa::path(
    put,
    path = "/api/buildings/{id}",
    tag = "Buildings",
    request_body = UpdateBuildingPayload,
    responses(
        (status = 200, description = "Prédio atualizado", body = Building),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Acesso negado ou recurso não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do prédio")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn update_building(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(building_id): Path<Uuid>,
    Json(payload): Json<UpdateBuildingPayload>,
) -> Result<Json<Building>, AppError> {
    let building = app_state
        .building_service
        .update(&user, building_id, payload)
        .await?;
    Ok(Json(building))
}

#[utoipa::path(
    delete,
    path = "/api/buildings/{id}",
    tag = "Buildings",
    responses(
        (status = 204, description = "Prédio removido"),
        (status = 403, description = "Acesso negado ou recurso não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do prédio")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn delete_building(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(building_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    app_state.building_service.delete(&user, building_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/buildings/{id}/properties",
    tag = "Buildings",
    responses(
        (status = 200, description = "Unidades do prédio, cada uma com effectiveLevel", body = Vec<Property>),
        (status = 403, description = "Acesso negado ou recurso não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do prédio")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn list_building_properties(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(building_id): Path<Uuid>,
) -> Result<Json<Vec<Annotated<Property>>>, AppError> {
    let properties = app_state
        .property_service
        .list_for_building(&user, building_id)
        .await?;
    Ok(Json(properties))
}

// =============================================================================
//  UNIDADES
// =============================================================================

// Resposta de detalhe: a unidade + o prédio pai (quando há)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDetails {
    #[serde(flatten)]
    pub property: Property,
    pub building: Option<Building>,
}

impl From<PropertyWithBuilding> for PropertyDetails {
    fn from(value: PropertyWithBuilding) -> Self {
        Self {
            property: value.property,
            building: value.building,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/properties",
    tag = "Properties",
    request_body = CreatePropertyPayload,
    responses(
        (status = 201, description = "Unidade criada", body = Property),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Acesso negado ou recurso não encontrado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn create_property(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreatePropertyPayload>,
) -> Result<impl IntoResponse, AppError> {
    let property = app_state.property_service.create(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(property)))
}

#[utoipa::path(
    get,
    path = "/api/properties",
    tag = "Properties",
    responses(
        (status = 200, description = "Unidades visíveis, cada uma com effectiveLevel", body = Vec<Property>)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn list_properties(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<Annotated<Property>>>, AppError> {
    let properties = app_state.property_service.list_for_user(&user).await?;
    Ok(Json(properties))
}

#[utoipa::path(
    get,
    path = "/api/properties/{id}",
    tag = "Properties",
    responses(
        (status = 200, description = "Unidade com o prédio pai", body = PropertyDetails),
        (status = 403, description = "Acesso negado ou recurso não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da unidade")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_property(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(property_id): Path<Uuid>,
) -> Result<Json<PropertyDetails>, AppError> {
    let property = app_state.property_service.get(&user, property_id).await?;
    Ok(Json(property.into()))
}

#[utoipa::path(
    put,
    path = "/api/properties/{id}",
    tag = "Properties",
    request_body = UpdatePropertyPayload,
    responses(
        (status = 200, description = "Unidade atualizada", body = Property),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Acesso negado ou recurso não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da unidade")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn update_property(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(property_id): Path<Uuid>,
    Json(payload): Json<UpdatePropertyPayload>,
) -> Result<Json<Property>, AppError> {
    let property = app_state
        .property_service
        .update(&user, property_id, payload)
        .await?;
    Ok(Json(property))
}

#[utoipa::path(
    patch,
    path = "/api/properties/{id}/status",
    tag = "Properties",
    request_body = PropertyStatusPayload,
    responses(
        (status = 200, description = "Status alterado", body = Property),
        (status = 403, description = "Acesso negado ou recurso não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da unidade")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn change_property_status(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(property_id): Path<Uuid>,
    Json(payload): Json<PropertyStatusPayload>,
) -> Result<Json<Property>, AppError> {
    let property = app_state
        .property_service
        .change_status(&user, property_id, payload.status)
        .await?;
    Ok(Json(property))
}

#[utoipa::path(
    delete,
    path = "/api/properties/{id}",
    tag = "Properties",
    responses(
        (status = 204, description = "Unidade removida"),
        (status = 403, description = "Acesso negado ou recurso não encontrado"),
        (status = 422, description = "Regra de negócio violada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da unidade")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn delete_property(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(property_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    app_state.property_service.delete(&user, property_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
