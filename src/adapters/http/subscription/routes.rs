//! Axum router configuration for subscription endpoints.

use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{
    get_subscription_details, get_subscription_status, handle_stripe_webhook,
    SubscriptionAppState,
};

/// Create the subscription query router.
///
/// # Routes
/// - `GET /status` - Current user's status and tier
/// - `GET /details` - Latest subscription row
pub fn subscription_routes() -> Router<SubscriptionAppState> {
    Router::new()
        .route("/status", get(get_subscription_status))
        .route("/details", get(get_subscription_details))
}

/// Create the webhook router.
///
/// Separate from the query routes because webhooks carry no user identity;
/// they are authenticated by signature.
///
/// # Routes
/// - `POST /stripe` - Handle Stripe webhooks
pub fn webhook_routes() -> Router<SubscriptionAppState> {
    Router::new().route("/stripe", post(handle_stripe_webhook))
}

/// Combined router, mounted at `/subscription` and `/webhooks`.
pub fn subscription_router() -> Router<SubscriptionAppState> {
    Router::new()
        .nest("/subscription", subscription_routes())
        .nest("/webhooks", webhook_routes())
}

/// Complete application with state and middleware applied.
///
/// A panic in any handler becomes a `500`; nothing else does.
pub fn build_app(state: SubscriptionAppState, request_timeout: Duration) -> Router {
    subscription_router()
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(request_timeout))
                .layer(CatchPanicLayer::new()),
        )
}
