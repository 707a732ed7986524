//! SubscriptionStatusService - read-side facade over user access and
//! subscription rows.
//!
//! Never fails: a user with no row reads as free, and a failed read is
//! logged and reads as free too. Access decisions read the same row but
//! default to `{inactive, free}`.

use std::sync::Arc;

use crate::domain::foundation::UserId;
use crate::domain::subscription::{StatusSnapshot, SubscriptionRecord, SubscriptionStatus};
use crate::ports::{SubscriptionRepository, UserAccessRepository};

/// Query facade used by the HTTP surface and the UI.
#[derive(Clone)]
pub struct SubscriptionStatusService {
    users: Arc<dyn UserAccessRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl SubscriptionStatusService {
    pub fn new(
        users: Arc<dyn UserAccessRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
    ) -> Self {
        Self {
            users,
            subscriptions,
        }
    }

    /// Status and tier for a user, or `{free, free}`.
    pub async fn get_status(&self, user_id: &UserId) -> StatusSnapshot {
        self.read_status(user_id)
            .await
            .unwrap_or_else(StatusSnapshot::free)
    }

    /// Status for an access decision, or `{inactive, free}` when unknown.
    pub async fn get_access_status(&self, user_id: &UserId) -> StatusSnapshot {
        self.read_status(user_id)
            .await
            .unwrap_or_else(StatusSnapshot::inactive)
    }

    /// Stored snapshot; `None` when there is no row or the read failed.
    async fn read_status(&self, user_id: &UserId) -> Option<StatusSnapshot> {
        match self.users.find_status(user_id).await {
            Ok(Some(snapshot)) => Some(snapshot),
            Ok(None) => {
                tracing::debug!(user_id = %user_id, "No access record; using default status");
                None
            }
            Err(err) => {
                tracing::error!(
                    user_id = %user_id,
                    error_code = %err.code,
                    db_code = err.db_code(),
                    hint = err.hint(),
                    error = %err.message,
                    "Failed to read subscription status; using default status"
                );
                None
            }
        }
    }

    /// Most recently created subscription row, for display only.
    pub async fn get_latest_subscription_details(
        &self,
        user_id: &UserId,
    ) -> Option<SubscriptionRecord> {
        match self.subscriptions.find_latest_for_user(user_id).await {
            Ok(record) => record,
            Err(err) => {
                tracing::error!(
                    user_id = %user_id,
                    error_code = %err.code,
                    db_code = err.db_code(),
                    hint = err.hint(),
                    error = %err.message,
                    "Failed to read subscription details"
                );
                None
            }
        }
    }

    /// True iff the status unlocks gated views.
    pub fn is_active(status: SubscriptionStatus) -> bool {
        status.is_active()
    }
}
