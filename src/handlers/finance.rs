// src/handlers/finance.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    access::Annotated,
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::finance::{
        Contract, ContractListing, ContractStatusPayload, CreateContractPayload,
        CreatePaymentPayload, CreateRenterPayload, Payment, PaymentListing, Renter, RenterDetails,
        UpdateContractPayload, UpdatePaymentPayload, UpdateRenterPayload,
    },
};

// =============================================================================
//  CONTRATOS
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/contracts",
    tag = "Contracts",
    request_body = CreateContractPayload,
    responses(
        (status = 201, description = "Contrato criado", body = Contract),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Acesso negado ou recurso não encontrado"),
        (status = 422, description = "Regra de negócio violada")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn create_contract(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateContractPayload>,
) -> Result<impl IntoResponse, AppError> {
    let contract = app_state.contract_service.create(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(contract)))
}

#[utoipa::path(
    get,
    path = "/api/contracts",
    tag = "Contracts",
    responses(
        (status = 200, description = "Contratos visíveis do workspace, cada um com effectiveLevel", body = Vec<Contract>)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn list_contracts(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<Annotated<ContractListing>>>, AppError> {
    let contracts = app_state.contract_service.list_for_user(&user).await?;
    Ok(Json(contracts))
}

#[utoipa::path(
    get,
    path = "/api/properties/{id}/contracts",
    tag = "Contracts",
    responses(
        (status = 200, description = "Contratos da unidade", body = Vec<Contract>),
        (status = 403, description = "Acesso negado ou recurso não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da unidade")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn list_property_contracts(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(property_id): Path<Uuid>,
) -> Result<Json<Vec<Contract>>, AppError> {
    let contracts = app_state
        .contract_service
        .list_for_property(&user, property_id)
        .await?;
    Ok(Json(contracts))
}

#[utoipa::path(
    get,
    path = "/api/contracts/{id}",
    tag = "Contracts",
    responses(
        (status = 200, description = "Contrato", body = Contract),
        (status = 403, description = "Acesso negado ou recurso não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do contrato")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_contract(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(contract_id): Path<Uuid>,
) -> Result<Json<Contract>, AppError> {
    let contract = app_state.contract_service.get(&user, contract_id).await?;
    Ok(Json(contract))
}

#[utoipa::path(
    put,
    path = "/api/contracts/{id}",
    tag = "Contracts",
    request_body = UpdateContractPayload,
    responses(
        (status = 200, description = "Contrato atualizado", body = Contract),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Acesso negado ou recurso não encontrado"),
        (status = 422, description = "Regra de negócio violada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do contrato")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn update_contract(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(contract_id): Path<Uuid>,
    Json(payload): Json<UpdateContractPayload>,
) -> Result<Json<Contract>, AppError> {
    let contract = app_state
        .contract_service
        .update(&user, contract_id, payload)
        .await?;
    Ok(Json(contract))
}

#[utoipa::path(
    patch,
    path = "/api/contracts/{id}/status",
    tag = "Contracts",
    request_body = ContractStatusPayload,
    responses(
        (status = 200, description = "Status alterado", body = Contract),
        (status = 403, description = "Acesso negado ou recurso não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do contrato")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn change_contract_status(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(contract_id): Path<Uuid>,
    Json(payload): Json<ContractStatusPayload>,
) -> Result<Json<Contract>, AppError> {
    let contract = app_state
        .contract_service
        .change_status(&user, contract_id, payload.status)
        .await?;
    Ok(Json(contract))
}

#[utoipa::path(
    delete,
    path = "/api/contracts/{id}",
    tag = "Contracts",
    responses(
        (status = 204, description = "Contrato removido"),
        (status = 403, description = "Acesso negado ou recurso não encontrado"),
        (status = 422, description = "Regra de negócio violada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do contrato")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn delete_contract(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(contract_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    app_state.contract_service.delete(&user, contract_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  PAGAMENTOS
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/payments",
    tag = "Payments",
    request_body = CreatePaymentPayload,
    responses(
        (status = 201, description = "Pagamento registrado", body = Payment),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Acesso negado ou recurso não encontrado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn create_payment(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreatePaymentPayload>,
) -> Result<impl IntoResponse, AppError> {
    let payment = app_state.payment_service.create(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

#[utoipa::path(
    get,
    path = "/api/payments",
    tag = "Payments",
    responses(
        (status = 200, description = "Pagamentos visíveis do workspace, cada um com effectiveLevel", body = Vec<Payment>)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn list_payments(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<Annotated<PaymentListing>>>, AppError> {
    let payments = app_state.payment_service.list_for_user(&user).await?;
    Ok(Json(payments))
}

#[utoipa::path(
    get,
    path = "/api/contracts/{id}/payments",
    tag = "Payments",
    responses(
        (status = 200, description = "Pagamentos do contrato", body = Vec<Payment>),
        (status = 403, description = "Acesso negado ou recurso não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do contrato")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn list_contract_payments(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(contract_id): Path<Uuid>,
) -> Result<Json<Vec<Payment>>, AppError> {
    let payments = app_state
        .payment_service
        .list_for_contract(&user, contract_id)
        .await?;
    Ok(Json(payments))
}

#[utoipa::path(
    get,
    path = "/api/payments/{id}",
    tag = "Payments",
    responses(
        (status = 200, description = "Pagamento", body = Payment),
        (status = 403, description = "Acesso negado ou recurso não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do pagamento")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_payment(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<Payment>, AppError> {
    let payment = app_state.payment_service.get(&user, payment_id).await?;
    Ok(Json(payment))
}

#[utoipa::path(
    put,
    path = "/api/payments/{id}",
    tag = "Payments",
    request_body = UpdatePaymentPayload,
    responses(
        (status = 200, description = "Pagamento atualizado", body = Payment),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Acesso negado ou recurso não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do pagamento")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn update_payment(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(payment_id): Path<Uuid>,
    Json(payload): Json<UpdatePaymentPayload>,
) -> Result<Json<Payment>, AppError> {
    let payment = app_state
        .payment_service
        .update(&user, payment_id, payload)
        .await?;
    Ok(Json(payment))
}

#[utoipa::path(
    delete,
    path = "/api/payments/{id}",
    tag = "Payments",
    responses(
        (status = 204, description = "Pagamento removido"),
        (status = 403, description = "Acesso negado ou recurso não encontrado"),
        (status = 422, description = "Regra de negócio violada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do pagamento")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn delete_payment(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(payment_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    app_state.payment_service.delete(&user, payment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  LOCATÁRIOS
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/renters",
    tag = "Renters",
    request_body = CreateRenterPayload,
    responses(
        (status = 201, description = "Locatário criado", body = Renter),
        (status = 400, description = "Dados inválidos")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn create_renter(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateRenterPayload>,
) -> Result<impl IntoResponse, AppError> {
    let renter = app_state.renter_service.create(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(renter)))
}

#[utoipa::path(
    get,
    path = "/api/renters",
    tag = "Renters",
    responses(
        (status = 200, description = "Locatários do workspace", body = Vec<Renter>)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn list_renters(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<Renter>>, AppError> {
    let renters = app_state.renter_service.list(&user).await?;
    Ok(Json(renters))
}

#[utoipa::path(
    get,
    path = "/api/renters/{id}",
    tag = "Renters",
    responses(
        (status = 200, description = "Locatário com documento decifrado", body = RenterDetails),
        (status = 403, description = "Acesso negado ou recurso não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do locatário")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_renter(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(renter_id): Path<Uuid>,
) -> Result<Json<RenterDetails>, AppError> {
    let renter = app_state.renter_service.get(&user, renter_id).await?;
    Ok(Json(renter))
}

#[utoipa::path(
    put,
    path = "/api/renters/{id}",
    tag = "Renters",
    request_body = UpdateRenterPayload,
    responses(
        (status = 200, description = "Locatário atualizado", body = Renter),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Acesso negado ou recurso não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do locatário")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn update_renter(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(renter_id): Path<Uuid>,
    Json(payload): Json<UpdateRenterPayload>,
) -> Result<Json<Renter>, AppError> {
    let renter = app_state
        .renter_service
        .update(&user, renter_id, payload)
        .await?;
    Ok(Json(renter))
}

#[utoipa::path(
    delete,
    path = "/api/renters/{id}",
    tag = "Renters",
    responses(
        (status = 204, description = "Locatário removido"),
        (status = 403, description = "Acesso negado ou recurso não encontrado"),
        (status = 422, description = "Regra de negócio violada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do locatário")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn delete_renter(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(renter_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    app_state.renter_service.delete(&user, renter_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
