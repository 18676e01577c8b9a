pub mod audit;
pub mod auth;
pub mod finance;
pub mod holdings;
pub mod permission;
