//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `BillingProvider` - Live subscription lookups at the payment provider
//! - `SubscriptionRepository` - Subscription rows keyed by provider id
//! - `UserAccessRepository` - Per-user status and tier
//! - `ViewNavigator` - Host UI notifications and navigation

mod billing_provider;
mod subscription_repository;
mod user_access_repository;
mod view_navigator;

pub use billing_provider::{BillingProvider, PaymentError, PaymentErrorCode};
pub use subscription_repository::SubscriptionRepository;
pub use user_access_repository::UserAccessRepository;
pub use view_navigator::{Notice, ViewNavigator};
