pub mod auth;
pub mod finance;
pub mod holdings;
pub mod team;
