//! Subscription repository port.
//!
//! Rows are keyed by `provider_subscription_id`. Writing the same
//! subscription twice must leave exactly one row.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::subscription::SubscriptionRecord;

/// Repository port for subscription rows.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Insert, or overwrite the row with the same provider subscription id.
    ///
    /// On conflict, owner, status, price, periods and trial bounds are
    /// replaced and `updated_at` is bumped. `created_at` is kept.
    async fn upsert(&self, record: &SubscriptionRecord) -> Result<(), DomainError>;

    /// Most recently created subscription for a user, if any.
    async fn find_latest_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SubscriptionRecord>, DomainError>;
}
