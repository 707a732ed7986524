//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Command handlers own the webhook write path; the status service and the
//! access gate are read-only.

pub mod access_gate;
pub mod handlers;

pub use access_gate::{AccessGate, GuardOptions};
pub use handlers::subscription::{
    HandleBillingWebhookCommand, HandleBillingWebhookHandler, HandleBillingWebhookResult,
    ReconcileSubscriptionHandler, SubscriptionStatusService,
};
