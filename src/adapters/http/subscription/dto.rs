//! Request and response DTOs for subscription endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;
use crate::domain::subscription::{
    StatusSnapshot, SubscriptionRecord, SubscriptionStatus, SubscriptionTier,
};

/// Body returned for every verified webhook delivery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebhookAckResponse {
    pub received: bool,
}

impl WebhookAckResponse {
    pub fn received() -> Self {
        Self { received: true }
    }
}

/// `GET /subscription/status` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionStatusResponse {
    pub status: SubscriptionStatus,
    pub tier: SubscriptionTier,
    pub is_active: bool,
}

impl From<StatusSnapshot> for SubscriptionStatusResponse {
    fn from(snapshot: StatusSnapshot) -> Self {
        Self {
            status: snapshot.status,
            tier: snapshot.tier,
            is_active: snapshot.is_active(),
        }
    }
}

/// `GET /subscription/details` response body when a row exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionDetailsResponse {
    pub provider_subscription_id: String,
    pub provider_price_id: Option<String>,
    pub status: SubscriptionStatus,
    pub tier: SubscriptionTier,
    pub current_period_start: Timestamp,
    pub current_period_end: Timestamp,
    pub trial_start: Option<Timestamp>,
    pub trial_end: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl From<SubscriptionRecord> for SubscriptionDetailsResponse {
    fn from(record: SubscriptionRecord) -> Self {
        Self {
            tier: record.tier(),
            provider_subscription_id: record.provider_subscription_id,
            provider_price_id: record.provider_price_id,
            status: record.status,
            current_period_start: record.current_period_start,
            current_period_end: record.current_period_end,
            trial_start: record.trial_start,
            trial_end: record.trial_end,
            created_at: record.created_at,
        }
    }
}

/// Standard error response for API errors.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_response_includes_is_active() {
        let response =
            SubscriptionStatusResponse::from(StatusSnapshot::for_status(SubscriptionStatus::Trialing));
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["status"], "trialing");
        assert_eq!(json["tier"], "pro");
        assert_eq!(json["is_active"], true);
    }

    #[test]
    fn ack_serializes_received_true() {
        let json = serde_json::to_string(&WebhookAckResponse::received()).unwrap();
        assert_eq!(json, r#"{"received":true}"#);
    }

    #[test]
    fn error_response_skips_missing_details() {
        let json = serde_json::to_value(ErrorResponse::new("INVALID_SIGNATURE", "bad")).unwrap();
        assert!(json.get("details").is_none());
        assert_eq!(json["error_code"], "INVALID_SIGNATURE");
    }
}
