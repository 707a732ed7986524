//! ReconcileSubscriptionHandler - turns a provider subscription into a stored
//! subscription row and a projected user status.

use std::sync::Arc;

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::subscription::{
    ProviderSubscription, SubscriptionRecord, SubscriptionStatus, SubscriptionTier,
};
use crate::ports::{SubscriptionRepository, UserAccessRepository};

use super::errors::ReconcileError;
use super::project_user_status::ProjectUserStatusHandler;

/// Result of a reconciliation that stored its subscription row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub user_id: UserId,
    pub subscription_id: String,
    pub status: SubscriptionStatus,
    pub tier: SubscriptionTier,
    /// False when the row was stored but the user record update failed.
    pub user_projected: bool,
}

/// Handler that upserts a subscription and projects it onto its owner.
///
/// Idempotent: reconciling the same subscription twice leaves the same row
/// and the same user status as reconciling it once.
pub struct ReconcileSubscriptionHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    projector: ProjectUserStatusHandler,
}

impl ReconcileSubscriptionHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        users: Arc<dyn UserAccessRepository>,
    ) -> Self {
        Self {
            subscriptions,
            projector: ProjectUserStatusHandler::new(users),
        }
    }

    /// Reconciles using the status the provider reported.
    pub async fn reconcile(
        &self,
        subscription: &ProviderSubscription,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        self.apply(subscription, subscription.canonical_status()).await
    }

    /// Reconciles a deleted subscription: always `Canceled`, whatever the
    /// payload says.
    pub async fn reconcile_deleted(
        &self,
        subscription: &ProviderSubscription,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        self.apply(subscription, SubscriptionStatus::Canceled).await
    }

    async fn apply(
        &self,
        subscription: &ProviderSubscription,
        status: SubscriptionStatus,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        // All preconditions before the first write.
        let current_period_start = subscription
            .current_period_start
            .ok_or(ReconcileError::MissingField("current_period_start"))?;
        let current_period_end = subscription
            .current_period_end
            .ok_or(ReconcileError::MissingField("current_period_end"))?;
        let user_id = subscription
            .user_id
            .as_deref()
            .and_then(|id| UserId::new(id).ok())
            .ok_or(ReconcileError::MissingAttribution)?;

        let now = Timestamp::now();
        let record = SubscriptionRecord {
            user_id: user_id.clone(),
            provider_subscription_id: subscription.id.clone(),
            provider_price_id: subscription.price_id.clone(),
            status,
            current_period_start,
            current_period_end,
            trial_start: subscription.trial_start,
            trial_end: subscription.trial_end,
            created_at: now,
            updated_at: now,
        };

        self.subscriptions.upsert(&record).await?;

        let user_projected = match self.projector.project(&user_id, status).await {
            Ok(_) => true,
            Err(err) => {
                tracing::error!(
                    user_id = %user_id,
                    subscription_id = %subscription.id,
                    status = %status,
                    error_code = %err.code,
                    db_code = err.db_code(),
                    hint = err.hint(),
                    error = %err.message,
                    "Subscription stored but user status update failed"
                );
                false
            }
        };

        tracing::info!(
            user_id = %user_id,
            subscription_id = %subscription.id,
            status = %status,
            tier = %status.tier(),
            user_projected,
            "Subscription reconciled"
        );

        Ok(ReconcileOutcome {
            user_id,
            subscription_id: subscription.id.clone(),
            status,
            tier: status.tier(),
            user_projected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySubscriptionStore;
    use crate::domain::foundation::{DomainError, ErrorCode};
    use crate::application::handlers::subscription::ReconcileErrorKind;

    // ════════════════════════════════════════════════════════════════════════════
    // Fixtures
    // ════════════════════════════════════════════════════════════════════════════

    fn user() -> UserId {
        UserId::new("5d0c6a8e-0000-4000-8000-000000000001").unwrap()
    }

    fn provider_subscription(id: &str, status: &str) -> ProviderSubscription {
        ProviderSubscription {
            id: id.to_string(),
            status: status.to_string(),
            price_id: Some("price_pro_monthly".to_string()),
            current_period_start: Timestamp::from_unix_secs(1_704_067_200),
            current_period_end: Timestamp::from_unix_secs(1_706_745_600),
            trial_start: None,
            trial_end: None,
            user_id: Some(user().to_string()),
        }
    }

    fn setup() -> (Arc<InMemorySubscriptionStore>, ReconcileSubscriptionHandler) {
        let store = Arc::new(InMemorySubscriptionStore::new());
        store.insert_user(&user());
        let handler = ReconcileSubscriptionHandler::new(store.clone(), store.clone());
        (store, handler)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Success Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn reconcile_stores_row_and_projects_user() {
        let (store, handler) = setup();

        let outcome = handler
            .reconcile(&provider_subscription("sub_1", "trialing"))
            .await
            .unwrap();

        assert_eq!(outcome.status, SubscriptionStatus::Trialing);
        assert_eq!(outcome.tier, SubscriptionTier::Pro);
        assert!(outcome.user_projected);

        let row = store.subscription("sub_1").unwrap();
        assert_eq!(row.user_id, user());
        assert_eq!(row.provider_price_id.as_deref(), Some("price_pro_monthly"));
        assert_eq!(row.current_period_end.as_unix_secs(), 1_706_745_600);

        let user_status = store.user_status(&user()).unwrap();
        assert_eq!(user_status.status, SubscriptionStatus::Trialing);
        assert_eq!(user_status.tier, SubscriptionTier::Pro);
    }

    #[tokio::test]
    async fn reconcile_twice_is_idempotent() {
        let (store, handler) = setup();
        let sub = provider_subscription("sub_1", "active");

        handler.reconcile(&sub).await.unwrap();
        let first_row = store.subscription("sub_1").unwrap();
        let first_user = store.user_status(&user());

        handler.reconcile(&sub).await.unwrap();
        let second_row = store.subscription("sub_1").unwrap();

        assert_eq!(store.subscription_count(), 1);
        assert_eq!(store.user_status(&user()), first_user);
        assert_eq!(second_row.status, first_row.status);
        assert_eq!(second_row.created_at, first_row.created_at);
    }

    #[tokio::test]
    async fn deleted_forces_canceled_regardless_of_payload() {
        let (store, handler) = setup();

        let outcome = handler
            .reconcile_deleted(&provider_subscription("sub_123", "active"))
            .await
            .unwrap();

        assert_eq!(outcome.status, SubscriptionStatus::Canceled);
        assert_eq!(outcome.tier, SubscriptionTier::Free);
        assert_eq!(
            store.subscription("sub_123").unwrap().status,
            SubscriptionStatus::Canceled
        );
    }

    #[tokio::test]
    async fn unknown_provider_status_stores_inactive() {
        let (store, handler) = setup();

        handler
            .reconcile(&provider_subscription("sub_1", "paused"))
            .await
            .unwrap();

        assert_eq!(
            store.user_status(&user()).unwrap().status,
            SubscriptionStatus::Inactive
        );
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Precondition Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn missing_period_start_writes_nothing() {
        let (store, handler) = setup();
        let mut sub = provider_subscription("sub_1", "active");
        sub.current_period_start = None;

        let err = handler.reconcile(&sub).await.unwrap_err();

        assert!(matches!(err, ReconcileError::MissingField("current_period_start")));
        assert_eq!(err.kind(), ReconcileErrorKind::Data);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn missing_period_end_writes_nothing() {
        let (store, handler) = setup();
        let mut sub = provider_subscription("sub_1", "active");
        sub.current_period_end = None;

        let err = handler.reconcile(&sub).await.unwrap_err();

        assert!(matches!(err, ReconcileError::MissingField("current_period_end")));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn missing_owner_writes_nothing() {
        let (store, handler) = setup();
        let mut sub = provider_subscription("sub_1", "active");
        sub.user_id = None;

        let err = handler.reconcile_deleted(&sub).await.unwrap_err();

        assert_eq!(err.kind(), ReconcileErrorKind::Attribution);
        assert_eq!(store.write_count(), 0);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Failure Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn projection_failure_after_upsert_is_tolerated() {
        let (store, handler) = setup();
        store.fail_user_updates(
            DomainError::new(ErrorCode::DatabaseError, "deadlock detected")
                .with_detail("db_code", "40P01"),
        );

        let outcome = handler
            .reconcile(&provider_subscription("sub_1", "active"))
            .await
            .unwrap();

        assert!(!outcome.user_projected);
        assert!(store.subscription("sub_1").is_some());
        assert_eq!(store.user_status(&user()).unwrap().status, SubscriptionStatus::Free);
    }

    #[tokio::test]
    async fn upsert_failure_is_transient_and_skips_projection() {
        let (store, handler) = setup();
        store.fail_subscription_upserts(DomainError::new(ErrorCode::DatabaseError, "down"));

        let err = handler
            .reconcile(&provider_subscription("sub_1", "active"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ReconcileErrorKind::Transient);
        assert_eq!(store.user_update_count(), 0);
    }

    #[tokio::test]
    async fn owner_id_rejected_by_store_is_an_attribution_failure() {
        let (store, handler) = setup();
        store.fail_subscription_upserts(DomainError::new(
            ErrorCode::ValidationFailed,
            "User ID must be a valid UUID",
        ));

        let err = handler
            .reconcile(&provider_subscription("sub_1", "active"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ReconcileErrorKind::Attribution);
        assert_eq!(store.user_update_count(), 0);
    }
}
