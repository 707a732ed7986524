//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `http` - Axum routes for webhooks and status queries
//! - `memory` - In-memory store for tests and local runs
//! - `postgres` - PostgreSQL repositories
//! - `stripe` - Stripe billing provider client

pub mod http;
pub mod memory;
pub mod postgres;
pub mod stripe;

pub use memory::InMemorySubscriptionStore;
pub use postgres::{PostgresSubscriptionRepository, PostgresUserAccessRepository};
pub use stripe::{MockBillingProvider, StripeBillingAdapter, StripeConfig};
