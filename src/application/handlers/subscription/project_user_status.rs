//! ProjectUserStatusHandler - mirrors a canonical status onto the user's
//! access record.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::subscription::{StatusSnapshot, SubscriptionStatus};
use crate::ports::UserAccessRepository;

/// Handler that writes `(status, tier)` to the user access record.
///
/// The tier is always recomputed from the status, never taken from input.
#[derive(Clone)]
pub struct ProjectUserStatusHandler {
    users: Arc<dyn UserAccessRepository>,
}

impl ProjectUserStatusHandler {
    pub fn new(users: Arc<dyn UserAccessRepository>) -> Self {
        Self { users }
    }

    pub async fn project(
        &self,
        user_id: &UserId,
        status: SubscriptionStatus,
    ) -> Result<StatusSnapshot, DomainError> {
        let snapshot = StatusSnapshot::for_status(status);
        self.users.update_status(user_id, snapshot).await?;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySubscriptionStore;
    use crate::domain::subscription::SubscriptionTier;

    #[tokio::test]
    async fn projects_status_with_derived_tier() {
        let store = Arc::new(InMemorySubscriptionStore::new());
        let user = UserId::new("user-1").unwrap();
        store.insert_user(&user);
        let handler = ProjectUserStatusHandler::new(store.clone());

        let snapshot = handler.project(&user, SubscriptionStatus::PastDue).await.unwrap();

        assert_eq!(snapshot.tier, SubscriptionTier::Pro);
        assert_eq!(store.user_status(&user), Some(snapshot));
    }

    #[tokio::test]
    async fn missing_user_record_is_an_error() {
        let store = Arc::new(InMemorySubscriptionStore::new());
        let handler = ProjectUserStatusHandler::new(store);
        let user = UserId::new("ghost").unwrap();

        assert!(handler.project(&user, SubscriptionStatus::Active).await.is_err());
    }
}
