//! Subscription handlers.
//!
//! ## Commands
//! - Handling billing webhooks (verify, narrow, route)
//! - Reconciling provider subscriptions into stored rows
//! - Projecting canonical status onto user access records
//!
//! ## Queries
//! - Subscription status and latest subscription details

mod errors;
mod get_subscription_status;
mod handle_billing_webhook;
mod project_user_status;
mod reconcile_subscription;

pub use errors::{ReconcileError, ReconcileErrorKind};
pub use get_subscription_status::SubscriptionStatusService;
pub use handle_billing_webhook::{
    HandleBillingWebhookCommand, HandleBillingWebhookHandler, HandleBillingWebhookResult,
};
pub use project_user_status::ProjectUserStatusHandler;
pub use reconcile_subscription::{ReconcileOutcome, ReconcileSubscriptionHandler};
