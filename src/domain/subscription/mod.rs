//! Subscription domain module.
//!
//! Mirrors payment-provider subscription state into canonical status and
//! tier values.
//!
//! # Module Structure
//!
//! - `status` - SubscriptionStatus and the status to tier mapping
//! - `tier` - SubscriptionTier access levels
//! - `record` - Stored subscription rows and user status snapshots
//! - `stripe_event` - Webhook envelope and narrowed `BillingEvent`
//! - `webhook_verifier` - Stripe-Signature verification
//! - `webhook_errors` - Rejections at the webhook boundary

mod record;
mod status;
mod tier;

pub mod stripe_event;
pub mod webhook_errors;
pub mod webhook_verifier;

pub use record::{ProviderSubscription, StatusSnapshot, SubscriptionRecord};
pub use status::SubscriptionStatus;
pub use stripe_event::{BillingEvent, PaymentOutcome, StripeEvent, StripeSubscriptionObject};
pub use tier::SubscriptionTier;
pub use webhook_errors::WebhookError;
pub use webhook_verifier::{sign_payload, StripeWebhookVerifier};
