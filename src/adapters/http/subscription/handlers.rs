//! HTTP handlers for subscription endpoints.
//!
//! These handlers connect Axum routes to application layer handlers.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequestParts, Json, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::application::handlers::subscription::{
    HandleBillingWebhookCommand, HandleBillingWebhookHandler, SubscriptionStatusService,
};
use crate::domain::foundation::UserId;
use crate::domain::subscription::WebhookError;

use super::dto::{
    ErrorResponse, SubscriptionDetailsResponse, SubscriptionStatusResponse, WebhookAckResponse,
};

/// Header carrying the Stripe webhook signature.
pub const STRIPE_SIGNATURE_HEADER: &str = "Stripe-Signature";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for subscription endpoints.
#[derive(Clone)]
pub struct SubscriptionAppState {
    pub webhook_handler: Arc<HandleBillingWebhookHandler>,
    pub status_service: SubscriptionStatusService,
}

// ════════════════════════════════════════════════════════════════════════════════
// User Context
// ════════════════════════════════════════════════════════════════════════════════

/// Authenticated user context extracted from request.
///
/// The auth proxy in front of this service resolves the session and
/// forwards the identity in `X-User-Id`.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

/// Rejection type for AuthenticatedUser extraction.
pub struct AuthenticationRequired;

impl IntoResponse for AuthenticationRequired {
    fn into_response(self) -> Response {
        let error = ErrorResponse::new("AUTHENTICATION_REQUIRED", "Authentication is required");
        (StatusCode::UNAUTHORIZED, Json(error)).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthenticationRequired;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("X-User-Id")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| UserId::new(s).ok())
            .ok_or(AuthenticationRequired)?;

        Ok(AuthenticatedUser { user_id })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Query Handlers (GET endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// GET /subscription/status - Current user's status and tier
pub async fn get_subscription_status(
    State(state): State<SubscriptionAppState>,
    user: AuthenticatedUser,
) -> Json<SubscriptionStatusResponse> {
    let snapshot = state.status_service.get_status(&user.user_id).await;
    Json(SubscriptionStatusResponse::from(snapshot))
}

/// GET /subscription/details - Latest subscription row, or `null`
pub async fn get_subscription_details(
    State(state): State<SubscriptionAppState>,
    user: AuthenticatedUser,
) -> Json<Option<SubscriptionDetailsResponse>> {
    let details = state
        .status_service
        .get_latest_subscription_details(&user.user_id)
        .await;
    Json(details.map(SubscriptionDetailsResponse::from))
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhook Handler
// ════════════════════════════════════════════════════════════════════════════════

/// POST /webhooks/stripe - Handle Stripe webhooks
///
/// The body is taken as raw bytes: the signature covers them exactly.
pub async fn handle_stripe_webhook(
    State(state): State<SubscriptionAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAckResponse>, WebhookApiError> {
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let cmd = HandleBillingWebhookCommand {
        payload: body.to_vec(),
        signature,
    };

    state.webhook_handler.handle(cmd).await?;

    Ok(Json(WebhookAckResponse::received()))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts webhook rejections to HTTP responses.
#[derive(Debug)]
pub struct WebhookApiError(WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> Response {
        let error = ErrorResponse::new(self.0.error_code(), self.0.to_string());
        (self.0.status_code(), Json(error)).into_response()
    }
}
