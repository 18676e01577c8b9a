// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,
        handlers::auth::get_my_access,

        // --- Buildings ---
        handlers::holdings::create_building,
        handlers::holdings::list_buildings,
        handlers::holdings::get_building,
        handlers::holdings::update_building,
        handlers::holdings::delete_building,
        handlers::holdings::list_building_properties,

        // --- Properties ---
        handlers::holdings::create_property,
        handlers::holdings::list_properties,
        handlers::holdings::get_property,
        handlers::holdings::update_property,
        handlers::holdings::change_property_status,
        handlers::holdings::delete_property,

        // --- Contracts ---
        handlers::finance::create_contract,
        handlers::finance::list_contracts,
        handlers::finance::list_property_contracts,
        handlers::finance::get_contract,
        handlers::finance::update_contract,
        handlers::finance::change_contract_status,
        handlers::finance::delete_contract,

        // --- Payments ---
        handlers::finance::create_payment,
        handlers::finance::list_payments,
        handlers::finance::list_contract_payments,
        handlers::finance::get_payment,
        handlers::finance::update_payment,
        handlers::finance::delete_payment,

        // --- Renters ---
        handlers::finance::create_renter,
        handlers::finance::list_renters,
        handlers::finance::get_renter,
        handlers::finance::update_renter,
        handlers::finance::delete_renter,

        // --- Team ---
        handlers::team::create_member,
        handlers::team::list_members,
        handlers::team::get_member,
        handlers::team::update_member,

        // --- Grants ---
        handlers::team::grant_building_access,
        handlers::team::list_building_grants,
        handlers::team::revoke_grant,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            models::auth::CreateMemberPayload,
            models::auth::UpdateMemberPayload,

            // --- Permissões ---
            models::permission::PermissionLevel,
            models::permission::PermissionGrant,
            models::permission::GrantPayload,
            models::permission::AccessSummary,

            // --- Holdings ---
            models::holdings::PropertyType,
            models::holdings::PropertyStatus,
            models::holdings::Building,
            models::holdings::Property,
            models::holdings::CreateBuildingPayload,
            models::holdings::UpdateBuildingPayload,
            models::holdings::CreatePropertyPayload,
            models::holdings::UpdatePropertyPayload,
            models::holdings::PropertyStatusPayload,
            handlers::holdings::PropertyDetails,

            // --- Finance ---
            models::finance::ContractStatus,
            models::finance::PaymentFrequency,
            models::finance::PaymentStatus,
            models::finance::PaymentMethod,
            models::finance::Renter,
            models::finance::RenterDetails,
            models::finance::Contract,
            models::finance::Payment,
            models::finance::CreateRenterPayload,
            models::finance::UpdateRenterPayload,
            models::finance::CreateContractPayload,
            models::finance::UpdateContractPayload,
            models::finance::ContractStatusPayload,
            models::finance::CreatePaymentPayload,
            models::finance::UpdatePaymentPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação"),
        (name = "Users", description = "Dados do Usuário e Nível de Acesso"),
        (name = "Buildings", description = "Gestão de Prédios"),
        (name = "Properties", description = "Gestão de Unidades"),
        (name = "Contracts", description = "Contratos de Locação"),
        (name = "Payments", description = "Pagamentos de Aluguel"),
        (name = "Renters", description = "Locatários"),
        (name = "Team", description = "Equipe do Workspace"),
        (name = "Grants", description = "Concessões de Acesso por Prédio")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
