//! In-memory implementation of both subscription repositories.
//!
//! Behaves like the Postgres adapters for the operations the ports define:
//! upsert by provider subscription id keeps `created_at`, and updating a
//! user without an access record fails with `UserNotFound`.
//!
//! Every port call is counted, and each operation can be made to fail, so
//! tests can assert "zero writes" and exercise degraded paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::domain::subscription::{StatusSnapshot, SubscriptionRecord};
use crate::ports::{SubscriptionRepository, UserAccessRepository};

#[derive(Default)]
struct InjectedFailures {
    subscription_upsert: Option<DomainError>,
    subscription_read: Option<DomainError>,
    user_update: Option<DomainError>,
    user_read: Option<DomainError>,
}

#[derive(Default)]
struct CallCounters {
    subscription_upserts: AtomicUsize,
    subscription_reads: AtomicUsize,
    user_updates: AtomicUsize,
    user_reads: AtomicUsize,
}

/// In-memory subscription and user access store.
///
/// # Example
///
/// ```ignore
/// let store = Arc::new(InMemorySubscriptionStore::new());
/// store.insert_user(&user_id);
///
/// reconciler.reconcile(&subscription).await?;
///
/// assert_eq!(store.subscription_count(), 1);
/// assert_eq!(store.user_status(&user_id).unwrap().tier, SubscriptionTier::Pro);
/// ```
#[derive(Default)]
pub struct InMemorySubscriptionStore {
    subscriptions: RwLock<HashMap<String, SubscriptionRecord>>,
    users: RwLock<HashMap<UserId, StatusSnapshot>>,
    failures: Mutex<InjectedFailures>,
    counters: CallCounters,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn subscriptions_read(&self) -> RwLockReadGuard<'_, HashMap<String, SubscriptionRecord>> {
        self.subscriptions.read().unwrap_or_else(|e| e.into_inner())
    }

    fn subscriptions_write(&self) -> RwLockWriteGuard<'_, HashMap<String, SubscriptionRecord>> {
        self.subscriptions.write().unwrap_or_else(|e| e.into_inner())
    }

    fn users_read(&self) -> RwLockReadGuard<'_, HashMap<UserId, StatusSnapshot>> {
        self.users.read().unwrap_or_else(|e| e.into_inner())
    }

    fn users_write(&self) -> RwLockWriteGuard<'_, HashMap<UserId, StatusSnapshot>> {
        self.users.write().unwrap_or_else(|e| e.into_inner())
    }

    fn injected<F>(&self, pick: F) -> Option<DomainError>
    where
        F: FnOnce(&InjectedFailures) -> &Option<DomainError>,
    {
        let failures = self.failures.lock().unwrap_or_else(|e| e.into_inner());
        pick(&failures).clone()
    }

    fn inject<F>(&self, set: F)
    where
        F: FnOnce(&mut InjectedFailures),
    {
        let mut failures = self.failures.lock().unwrap_or_else(|e| e.into_inner());
        set(&mut failures);
    }

    // === Seeding ===

    /// Creates the user's access record with free defaults, as signup does.
    pub fn insert_user(&self, user_id: &UserId) {
        self.users_write().insert(user_id.clone(), StatusSnapshot::free());
    }

    /// Seeds a user access record with a specific snapshot.
    pub fn insert_user_with(&self, user_id: &UserId, snapshot: StatusSnapshot) {
        self.users_write().insert(user_id.clone(), snapshot);
    }

    /// Seeds a subscription row directly, bypassing counters.
    pub fn insert_subscription(&self, record: SubscriptionRecord) {
        self.subscriptions_write()
            .insert(record.provider_subscription_id.clone(), record);
    }

    // === Failure injection ===

    pub fn fail_subscription_upserts(&self, error: DomainError) {
        self.inject(|f| f.subscription_upsert = Some(error));
    }

    pub fn fail_subscription_reads(&self, error: DomainError) {
        self.inject(|f| f.subscription_read = Some(error));
    }

    pub fn fail_user_updates(&self, error: DomainError) {
        self.inject(|f| f.user_update = Some(error));
    }

    pub fn fail_user_reads(&self, error: DomainError) {
        self.inject(|f| f.user_read = Some(error));
    }

    // === Assertions ===

    pub fn subscription(&self, provider_subscription_id: &str) -> Option<SubscriptionRecord> {
        self.subscriptions_read().get(provider_subscription_id).cloned()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions_read().len()
    }

    pub fn user_status(&self, user_id: &UserId) -> Option<StatusSnapshot> {
        self.users_read().get(user_id).copied()
    }

    /// Upserts plus user updates attempted, successful or not.
    pub fn write_count(&self) -> usize {
        self.counters.subscription_upserts.load(Ordering::SeqCst)
            + self.counters.user_updates.load(Ordering::SeqCst)
    }

    pub fn subscription_upsert_count(&self) -> usize {
        self.counters.subscription_upserts.load(Ordering::SeqCst)
    }

    pub fn user_update_count(&self) -> usize {
        self.counters.user_updates.load(Ordering::SeqCst)
    }

    pub fn user_read_count(&self) -> usize {
        self.counters.user_reads.load(Ordering::SeqCst)
    }

    pub fn subscription_read_count(&self) -> usize {
        self.counters.subscription_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionStore {
    async fn upsert(&self, record: &SubscriptionRecord) -> Result<(), DomainError> {
        self.counters.subscription_upserts.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.injected(|f| &f.subscription_upsert) {
            return Err(err);
        }

        let mut subscriptions = self.subscriptions_write();
        let created_at = subscriptions
            .get(&record.provider_subscription_id)
            .map(|existing| existing.created_at)
            .unwrap_or(record.created_at);

        let mut stored = record.clone();
        stored.created_at = created_at;
        stored.updated_at = Timestamp::now();
        subscriptions.insert(stored.provider_subscription_id.clone(), stored);
        Ok(())
    }

    async fn find_latest_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        self.counters.subscription_reads.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.injected(|f| &f.subscription_read) {
            return Err(err);
        }

        Ok(self
            .subscriptions_read()
            .values()
            .filter(|record| &record.user_id == user_id)
            .max_by_key(|record| record.created_at)
            .cloned())
    }
}

#[async_trait]
impl UserAccessRepository for InMemorySubscriptionStore {
    async fn update_status(
        &self,
        user_id: &UserId,
        snapshot: StatusSnapshot,
    ) -> Result<(), DomainError> {
        self.counters.user_updates.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.injected(|f| &f.user_update) {
            return Err(err);
        }

        match self.users_write().get_mut(user_id) {
            Some(existing) => {
                *existing = snapshot;
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::UserNotFound,
                format!("No access record for user {}", user_id),
            )),
        }
    }

    async fn find_status(&self, user_id: &UserId) -> Result<Option<StatusSnapshot>, DomainError> {
        self.counters.user_reads.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.injected(|f| &f.user_read) {
            return Err(err);
        }

        Ok(self.users_read().get(user_id).copied())
    }
}
