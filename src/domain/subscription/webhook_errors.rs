//! Webhook error types for the Stripe webhook boundary.
//!
//! Every variant is a security or payload-shape rejection raised before any
//! business logic runs. Reconciliation failures after verification are not
//! represented here: those are logged and acknowledged.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that reject an inbound webhook delivery.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The `Stripe-Signature` header was absent.
    #[error("Missing signature header")]
    MissingSignature,

    /// The signature header could not be parsed.
    #[error("Malformed signature header: {0}")]
    MalformedHeader(String),

    /// No v1 signature in the header matched the payload.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Signature timestamp is older than the tolerance window.
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Signature timestamp is in the future beyond clock skew tolerance.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// Verified payload is not a Stripe event envelope.
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl WebhookError {
    /// Stable machine-readable code, used in logs and error bodies.
    pub fn error_code(&self) -> &'static str {
        match self {
            WebhookError::MissingSignature => "MISSING_SIGNATURE",
            WebhookError::MalformedHeader(_) => "MALFORMED_SIGNATURE_HEADER",
            WebhookError::InvalidSignature => "INVALID_SIGNATURE",
            WebhookError::TimestampOutOfRange => "TIMESTAMP_OUT_OF_RANGE",
            WebhookError::InvalidTimestamp => "INVALID_TIMESTAMP",
            WebhookError::ParseError(_) => "INVALID_PAYLOAD",
        }
    }

    /// Maps the error to an HTTP status code.
    ///
    /// All rejections are client errors so the provider does not retry a
    /// delivery that can never verify.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}
