//! HTTP adapter for subscription endpoints.
//!
//! - `POST /webhooks/stripe` - Handle Stripe webhooks
//! - `GET /subscription/status` - Current user's status and tier
//! - `GET /subscription/details` - Latest subscription row, for display

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{AuthenticatedUser, SubscriptionAppState, STRIPE_SIGNATURE_HEADER};
pub use routes::{build_app, subscription_router};
