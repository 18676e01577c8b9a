// src/lib.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, patch, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod access;
pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::config::AppState;
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

// Monta o router principal (público + protegido)
pub fn app(app_state: AppState) -> Router {
    // Rotas de autenticação (públicas)
    let auth_routes = Router::new().route("/login", post(handlers::auth::login));

    // Tudo abaixo passa pelo auth_guard
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .route("/me/access", get(handlers::auth::get_my_access));

    let building_routes = Router::new()
        .route(
            "/",
            post(handlers::holdings::create_building).get(handlers::holdings::list_buildings),
        )
        .route(
            "/{id}",
            get(handlers::holdings::get_building)
                .put(handlers::holdings::update_building)
                .delete(handlers::holdings::delete_building),
        )
        .route("/{id}/properties", get(handlers::holdings::list_building_properties))
        .route(
            "/{id}/grants",
            post(handlers::team::grant_building_access).get(handlers::team::list_building_grants),
        );

    let property_routes = Router::new()
        .route(
            "/",
            post(handlers::holdings::create_property).get(handlers::holdings::list_properties),
        )
        .route(
            "/{id}",
            get(handlers::holdings::get_property)
                .put(handlers::holdings::update_property)
                .delete(handlers::holdings::delete_property),
        )
        .route("/{id}/status", patch(handlers::holdings::change_property_status))
        .route("/{id}/contracts", get(handlers::finance::list_property_contracts));

    let contract_routes = Router::new()
        .route(
            "/",
            post(handlers::finance::create_contract).get(handlers::finance::list_contracts),
        )
        .route(
            "/{id}",
            get(handlers::finance::get_contract)
                .put(handlers::finance::update_contract)
                .delete(handlers::finance::delete_contract),
        )
        .route("/{id}/status", patch(handlers::finance::change_contract_status))
        .route("/{id}/payments", get(handlers::finance::list_contract_payments));

    let payment_routes = Router::new()
        .route(
            "/",
            post(handlers::finance::create_payment).get(handlers::finance::list_payments),
        )
        .route(
            "/{id}",
            get(handlers::finance::get_payment)
                .put(handlers::finance::update_payment)
                .delete(handlers::finance::delete_payment),
        );

    let renter_routes = Router::new()
        .route(
            "/",
            post(handlers::finance::create_renter).get(handlers::finance::list_renters),
        )
        .route(
            "/{id}",
            get(handlers::finance::get_renter)
                .put(handlers::finance::update_renter)
                .delete(handlers::finance::delete_renter),
        );

    let team_routes = Router::new()
        .route(
            "/",
            post(handlers::team::create_member).get(handlers::team::list_members),
        )
        .route(
            "/{id}",
            get(handlers::team::get_member).put(handlers::team::update_member),
        );

    let grant_routes = Router::new().route("/{id}", delete(handlers::team::revoke_grant));

    let protected_routes = Router::new()
        .nest("/users", user_routes)
        .nest("/buildings", building_routes)
        .nest("/properties", property_routes)
        .nest("/contracts", contract_routes)
        .nest("/payments", payment_routes)
        .nest("/renters", renter_routes)
        .nest("/team", team_routes)
        .nest("/grants", grant_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api", protected_routes)
        .with_state(app_state)
}
