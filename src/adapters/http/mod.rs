//! HTTP adapters - REST API implementations.

pub mod subscription;

pub use subscription::{
    build_app, subscription_router, SubscriptionAppState, STRIPE_SIGNATURE_HEADER,
};
