// src/handlers/team.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        auth::{CreateMemberPayload, UpdateMemberPayload, User},
        permission::{GrantPayload, PermissionGrant},
    },
};

// =============================================================================
//  EQUIPE
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/team",
    tag = "Team",
    request_body = CreateMemberPayload,
    responses(
        (status = 201, description = "Membro criado", body = User),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Acesso negado ou recurso não encontrado"),
        (status = 409, description = "E-mail já cadastrado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn create_member(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateMemberPayload>,
) -> Result<impl IntoResponse, AppError> {
    let member = app_state.team_service.create_member(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

#[utoipa::path(
    get,
    path = "/api/team",
    tag = "Team",
    responses(
        (status = 200, description = "Membros da equipe", body = Vec<User>),
        (status = 403, description = "Acesso negado ou recurso não encontrado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn list_members(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<User>>, AppError> {
    let members = app_state.team_service.list_members(&user).await?;
    Ok(Json(members))
}

#[utoipa::path(
    get,
    path = "/api/team/{id}",
    tag = "Team",
    responses(
        (status = 200, description = "Membro", body = User),
        (status = 403, description = "Acesso negado ou recurso não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do membro")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_member(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(member_id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    let member = app_state.team_service.get_member(&user, member_id).await?;
    Ok(Json(member))
}

#[utoipa::path(
    put,
    path = "/api/team/{id}",
    tag = "Team",
    request_body = UpdateMemberPayload,
    responses(
        (status = 200, description = "Membro atualizado", body = User),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Acesso negado ou recurso não encontrado"),
        (status = 422, description = "Regra de negócio violada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do membro")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn update_member(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(member_id): Path<Uuid>,
    Json(payload): Json<UpdateMemberPayload>,
) -> Result<Json<User>, AppError> {
    let member = app_state
        .team_service
        .update_member(&user, member_id, payload)
        .await?;
    Ok(Json(member))
}

// =============================================================================
//  CONCESSÕES DE ACESSO
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/buildings/{id}/grants",
    tag = "Grants",
    request_body = GrantPayload,
    responses(
        (status = 201, description = "Acesso concedido", body = PermissionGrant),
        (status = 403, description = "Acesso negado ou recurso não encontrado"),
        (status = 422, description = "Regra de negócio violada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do prédio")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn grant_building_access(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(building_id): Path<Uuid>,
    Json(payload): Json<GrantPayload>,
) -> Result<impl IntoResponse, AppError> {
    let grant = app_state
        .grant_service
        .grant(&user, building_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(grant)))
}

#[utoipa::path(
    get,
    path = "/api/buildings/{id}/grants",
    tag = "Grants",
    responses(
        (status = 200, description = "Concessões válidas do prédio", body = Vec<PermissionGrant>),
        (status = 403, description = "Acesso negado ou recurso não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do prédio")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn list_building_grants(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(building_id): Path<Uuid>,
) -> Result<Json<Vec<PermissionGrant>>, AppError> {
    let grants = app_state
        .grant_service
        .list_for_building(&user, building_id)
        .await?;
    Ok(Json(grants))
}

#[utoipa::path(
    delete,
    path = "/api/grants/{id}",
    tag = "Grants",
    responses(
        (status = 204, description = "Concessão revogada"),
        (status = 403, description = "Acesso negado ou recurso não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da concessão")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn revoke_grant(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(grant_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    app_state.grant_service.revoke(&user, grant_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
