pub mod auth;
pub mod building_service;
pub mod contract_service;
pub mod grant_service;
pub mod payment_service;
pub mod property_service;
pub mod renter_service;
pub mod team_service;

pub use auth::AuthService;
pub use building_service::BuildingService;
pub use contract_service::ContractService;
pub use grant_service::GrantService;
pub use payment_service::PaymentService;
pub use property_service::PropertyService;
pub use renter_service::RenterService;
pub use team_service::TeamService;
