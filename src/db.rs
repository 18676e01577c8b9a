pub mod audit_repo;
pub use audit_repo::AuditRepository;
pub mod finance_repo;
pub use finance_repo::{FinanceRepository, NewContract};
pub mod grant_repo;
pub use grant_repo::GrantRepository;
pub mod holdings_repo;
pub use holdings_repo::HoldingsRepository;
pub mod user_repo;
pub use user_repo::UserRepository;
