//! Stripe billing provider adapter.
//!
//! Implements the `BillingProvider` port for Stripe, plus a configurable
//! mock for tests.
//!
//! # Security
//!
//! - The API key is held as `secrecy::SecretString`
//! - Webhook signatures are verified in the domain layer before any call
//!   reaches this adapter

mod mock_billing_provider;
mod stripe_adapter;

pub use mock_billing_provider::MockBillingProvider;
pub use stripe_adapter::{StripeBillingAdapter, StripeConfig};
