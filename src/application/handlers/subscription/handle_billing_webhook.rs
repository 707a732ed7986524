//! HandleBillingWebhookHandler - verifies a Stripe delivery and routes it to
//! reconciliation.
//!
//! Only verification can fail the request. Once a delivery is authentic
//! every outcome, including reconciliation failures, is logged and
//! acknowledged so the provider does not retry it.

use std::sync::Arc;

use crate::domain::subscription::{
    BillingEvent, PaymentOutcome, StripeEvent, StripeWebhookVerifier, WebhookError,
};
use crate::ports::BillingProvider;

use super::errors::{ReconcileError, ReconcileErrorKind};
use super::reconcile_subscription::{ReconcileOutcome, ReconcileSubscriptionHandler};

/// Command to handle a billing webhook.
#[derive(Debug, Clone)]
pub struct HandleBillingWebhookCommand {
    /// Raw request body, exactly as received.
    pub payload: Vec<u8>,
    /// `Stripe-Signature` header, if present.
    pub signature: Option<String>,
}

/// Result of an acknowledged delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleBillingWebhookResult {
    /// Subscription row stored.
    Reconciled(ReconcileOutcome),
    /// Event needs no action.
    Ignored { reason: String },
    /// Reconciliation aborted; logged, not retried.
    Failed { kind: ReconcileErrorKind },
}

/// Handler for verified billing webhooks.
pub struct HandleBillingWebhookHandler {
    verifier: StripeWebhookVerifier,
    billing: Arc<dyn BillingProvider>,
    reconciler: Arc<ReconcileSubscriptionHandler>,
}

impl HandleBillingWebhookHandler {
    pub fn new(
        verifier: StripeWebhookVerifier,
        billing: Arc<dyn BillingProvider>,
        reconciler: Arc<ReconcileSubscriptionHandler>,
    ) -> Self {
        Self {
            verifier,
            billing,
            reconciler,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandleBillingWebhookCommand,
    ) -> Result<HandleBillingWebhookResult, WebhookError> {
        // 1. Verify signature over the raw bytes
        let event = self.verify(&cmd)?;

        // 2. Narrow and route; nothing past here fails the request
        let result = match BillingEvent::from_event(&event) {
            Ok(billing_event) => self.route(billing_event).await,
            Err(e) => Err(ReconcileError::MalformedPayload(e.to_string())),
        };

        Ok(match result {
            Ok(handled) => {
                if let HandleBillingWebhookResult::Ignored { reason } = &handled {
                    tracing::info!(
                        event_id = %event.id,
                        event_type = %event.event_type,
                        reason = %reason,
                        "Webhook acknowledged without action"
                    );
                }
                handled
            }
            Err(err) => {
                log_reconcile_failure(&event, &err);
                HandleBillingWebhookResult::Failed { kind: err.kind() }
            }
        })
    }

    fn verify(&self, cmd: &HandleBillingWebhookCommand) -> Result<StripeEvent, WebhookError> {
        let result = match cmd.signature.as_deref() {
            Some(signature) => self.verifier.verify_and_parse(&cmd.payload, signature),
            None => Err(WebhookError::MissingSignature),
        };

        result.map_err(|err| {
            tracing::warn!(
                error_code = err.error_code(),
                error = %err,
                payload_bytes = cmd.payload.len(),
                "Rejected billing webhook"
            );
            err
        })
    }

    async fn route(
        &self,
        event: BillingEvent,
    ) -> Result<HandleBillingWebhookResult, ReconcileError> {
        match event {
            BillingEvent::SubscriptionChanged(subscription) => self
                .reconciler
                .reconcile(&subscription)
                .await
                .map(HandleBillingWebhookResult::Reconciled),

            BillingEvent::SubscriptionDeleted(subscription) => self
                .reconciler
                .reconcile_deleted(&subscription)
                .await
                .map(HandleBillingWebhookResult::Reconciled),

            BillingEvent::InvoicePayment {
                invoice_id,
                subscription_id,
                outcome,
            } => match subscription_id {
                Some(subscription_id) => {
                    tracing::debug!(
                        invoice_id = %invoice_id,
                        subscription_id = %subscription_id,
                        succeeded = outcome == PaymentOutcome::Succeeded,
                        "Re-fetching subscription for invoice"
                    );
                    self.fetch_and_reconcile(&subscription_id).await
                }
                None => Ok(HandleBillingWebhookResult::Ignored {
                    reason: format!("invoice {} has no subscription", invoice_id),
                }),
            },

            BillingEvent::CheckoutCompleted {
                session_id,
                mode,
                subscription_id,
            } => {
                if mode.as_deref() != Some("subscription") {
                    return Ok(HandleBillingWebhookResult::Ignored {
                        reason: format!("checkout session {} is not a subscription", session_id),
                    });
                }
                let subscription_id =
                    subscription_id.ok_or(ReconcileError::MissingField("subscription"))?;
                self.fetch_and_reconcile(&subscription_id).await
            }

            BillingEvent::Unrecognized { event_type } => Ok(HandleBillingWebhookResult::Ignored {
                reason: format!("unhandled event type {}", event_type),
            }),
        }
    }

    async fn fetch_and_reconcile(
        &self,
        subscription_id: &str,
    ) -> Result<HandleBillingWebhookResult, ReconcileError> {
        let subscription = self
            .billing
            .get_subscription(subscription_id)
            .await?
            .ok_or_else(|| ReconcileError::SubscriptionNotFound(subscription_id.to_string()))?;

        self.reconciler
            .reconcile(&subscription)
            .await
            .map(HandleBillingWebhookResult::Reconciled)
    }
}

fn log_reconcile_failure(event: &StripeEvent, err: &ReconcileError) {
    match err.kind() {
        ReconcileErrorKind::Data | ReconcileErrorKind::Attribution => tracing::warn!(
            event_id = %event.id,
            event_type = %event.event_type,
            kind = err.kind().as_str(),
            error = %err,
            "Billing event not reconciled"
        ),
        ReconcileErrorKind::Transient => tracing::error!(
            event_id = %event.id,
            event_type = %event.event_type,
            kind = err.kind().as_str(),
            error_code = %err.error_code(),
            hint = err.hint(),
            error = %err,
            "Billing event not reconciled"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySubscriptionStore;
    use crate::adapters::stripe::MockBillingProvider;
    use crate::domain::foundation::{Timestamp, UserId};
    use crate::domain::subscription::{
        sign_payload, ProviderSubscription, SubscriptionStatus, SubscriptionTier,
    };
    use crate::ports::PaymentError;
    use serde_json::json;

    const SECRET: &str = "whsec_handler_test";

    // ════════════════════════════════════════════════════════════════════════════
    // Fixtures
    // ════════════════════════════════════════════════════════════════════════════

    fn user() -> UserId {
        UserId::new("user-42").unwrap()
    }

    struct Harness {
        store: Arc<InMemorySubscriptionStore>,
        billing: MockBillingProvider,
        handler: HandleBillingWebhookHandler,
    }

    fn harness() -> Harness {
        let store = Arc::new(InMemorySubscriptionStore::new());
        store.insert_user(&user());
        let billing = MockBillingProvider::new();
        let reconciler = Arc::new(ReconcileSubscriptionHandler::new(store.clone(), store.clone()));
        let handler = HandleBillingWebhookHandler::new(
            StripeWebhookVerifier::new(SECRET),
            Arc::new(billing.clone()),
            reconciler,
        );
        Harness {
            store,
            billing,
            handler,
        }
    }

    fn subscription_object(id: &str, status: &str) -> serde_json::Value {
        json!({
            "id": id,
            "status": status,
            "current_period_start": 1704067200,
            "current_period_end": 1706745600,
            "items": { "data": [ { "price": { "id": "price_pro" } } ] },
            "metadata": { "supabase_user_id": "user-42" }
        })
    }

    fn live_subscription(id: &str, status: &str) -> ProviderSubscription {
        ProviderSubscription {
            id: id.to_string(),
            status: status.to_string(),
            price_id: Some("price_pro".to_string()),
            current_period_start: Timestamp::from_unix_secs(1_704_067_200),
            current_period_end: Timestamp::from_unix_secs(1_706_745_600),
            trial_start: None,
            trial_end: None,
            user_id: Some("user-42".to_string()),
        }
    }

    fn signed(event_type: &str, object: serde_json::Value) -> HandleBillingWebhookCommand {
        let payload = serde_json::to_vec(&json!({
            "id": "evt_1",
            "type": event_type,
            "data": { "object": object }
        }))
        .unwrap();
        let signature = sign_payload(SECRET, chrono::Utc::now().timestamp(), &payload);
        HandleBillingWebhookCommand {
            payload,
            signature: Some(signature),
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Verification Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn missing_signature_is_rejected() {
        let h = harness();
        let mut cmd = signed("customer.subscription.updated", subscription_object("sub_1", "active"));
        cmd.signature = None;

        let err = h.handler.handle(cmd).await.unwrap_err();

        assert!(matches!(err, WebhookError::MissingSignature));
        assert_eq!(h.store.write_count(), 0);
    }

    #[tokio::test]
    async fn tampered_payload_is_rejected_before_routing() {
        let h = harness();
        let mut cmd = signed("invoice.payment_failed", json!({ "id": "in_1", "subscription": "sub_1" }));
        let last = cmd.payload.len() - 2;
        cmd.payload[last] ^= 0x01;

        let err = h.handler.handle(cmd).await.unwrap_err();

        assert!(matches!(err, WebhookError::InvalidSignature));
        assert_eq!(h.billing.call_count(), 0);
        assert_eq!(h.store.write_count(), 0);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Routing Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn subscription_created_reconciles_payload() {
        let h = harness();

        let result = h
            .handler
            .handle(signed("customer.subscription.created", subscription_object("sub_1", "trialing")))
            .await
            .unwrap();

        assert!(matches!(result, HandleBillingWebhookResult::Reconciled(_)));
        assert_eq!(h.billing.call_count(), 0);
        assert_eq!(h.store.user_status(&user()).unwrap().status, SubscriptionStatus::Trialing);
    }

    #[tokio::test]
    async fn subscription_deleted_forces_canceled() {
        let h = harness();

        h.handler
            .handle(signed("customer.subscription.deleted", subscription_object("sub_123", "active")))
            .await
            .unwrap();

        let status = h.store.user_status(&user()).unwrap();
        assert_eq!(status.status, SubscriptionStatus::Canceled);
        assert_eq!(status.tier, SubscriptionTier::Free);
    }

    #[tokio::test]
    async fn invoice_failure_reconciles_live_subscription() {
        let h = harness();
        h.billing.set_subscription(live_subscription("sub_456", "past_due"));

        h.handler
            .handle(signed("invoice.payment_failed", json!({ "id": "in_1", "subscription": "sub_456" })))
            .await
            .unwrap();

        assert_eq!(h.billing.calls(), vec!["sub_456".to_string()]);
        let status = h.store.user_status(&user()).unwrap();
        assert_eq!(status.status, SubscriptionStatus::PastDue);
        assert_eq!(status.tier, SubscriptionTier::Pro);
    }

    #[tokio::test]
    async fn invoice_without_subscription_is_ignored() {
        let h = harness();

        let result = h
            .handler
            .handle(signed("invoice.payment_succeeded", json!({ "id": "in_1", "subscription": null })))
            .await
            .unwrap();

        assert!(matches!(result, HandleBillingWebhookResult::Ignored { .. }));
        assert_eq!(h.billing.call_count(), 0);
    }

    #[tokio::test]
    async fn checkout_in_payment_mode_is_a_no_op() {
        let h = harness();

        let result = h
            .handler
            .handle(signed("checkout.session.completed", json!({ "id": "cs_1", "mode": "payment" })))
            .await
            .unwrap();

        assert!(matches!(result, HandleBillingWebhookResult::Ignored { .. }));
        assert_eq!(h.billing.call_count(), 0);
        assert_eq!(h.store.write_count(), 0);
    }

    #[tokio::test]
    async fn checkout_in_subscription_mode_fetches_and_reconciles() {
        let h = harness();
        h.billing.set_subscription(live_subscription("sub_new", "active"));

        h.handler
            .handle(signed(
                "checkout.session.completed",
                json!({ "id": "cs_1", "mode": "subscription", "subscription": "sub_new" }),
            ))
            .await
            .unwrap();

        assert_eq!(h.billing.calls(), vec!["sub_new".to_string()]);
        assert!(h.store.subscription("sub_new").is_some());
    }

    #[tokio::test]
    async fn unrecognized_event_is_acknowledged() {
        let h = harness();

        let result = h
            .handler
            .handle(signed("customer.created", json!({ "id": "cus_1" })))
            .await
            .unwrap();

        assert!(matches!(result, HandleBillingWebhookResult::Ignored { .. }));
        assert_eq!(h.store.write_count(), 0);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Acknowledged Failure Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn missing_attribution_is_acknowledged_with_zero_writes() {
        let h = harness();
        let mut object = subscription_object("sub_1", "active");
        object["metadata"] = json!({});

        let result = h
            .handler
            .handle(signed("customer.subscription.updated", object))
            .await
            .unwrap();

        assert_eq!(
            result,
            HandleBillingWebhookResult::Failed {
                kind: ReconcileErrorKind::Attribution
            }
        );
        assert_eq!(h.store.write_count(), 0);
    }

    #[tokio::test]
    async fn provider_failure_is_acknowledged() {
        let h = harness();
        h.billing.set_error(PaymentError::network("connect timeout"));

        let result = h
            .handler
            .handle(signed("invoice.payment_succeeded", json!({ "id": "in_1", "subscription": "sub_9" })))
            .await
            .unwrap();

        assert_eq!(
            result,
            HandleBillingWebhookResult::Failed {
                kind: ReconcileErrorKind::Transient
            }
        );
    }

    #[tokio::test]
    async fn provider_without_subscription_is_acknowledged() {
        let h = harness();

        let result = h
            .handler
            .handle(signed("invoice.payment_succeeded", json!({ "id": "in_1", "subscription": "sub_gone" })))
            .await
            .unwrap();

        assert_eq!(
            result,
            HandleBillingWebhookResult::Failed {
                kind: ReconcileErrorKind::Data
            }
        );
        assert_eq!(h.store.write_count(), 0);
    }

    #[tokio::test]
    async fn malformed_object_is_acknowledged() {
        let h = harness();

        let result = h
            .handler
            .handle(signed("customer.subscription.updated", json!({ "status": "active" })))
            .await
            .unwrap();

        assert_eq!(
            result,
            HandleBillingWebhookResult::Failed {
                kind: ReconcileErrorKind::Data
            }
        );
    }
}
