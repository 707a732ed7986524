//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresSubscriptionRepository` - Subscription rows, upserted by provider id
//! - `PostgresUserAccessRepository` - Per-user status and tier

mod errors;
mod subscription_repository;
mod user_access_repository;

pub use subscription_repository::PostgresSubscriptionRepository;
pub use user_access_repository::PostgresUserAccessRepository;
