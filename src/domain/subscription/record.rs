//! Subscription rows, user status snapshots, and the narrowed provider
//! subscription they are reconciled from.

use serde::{Deserialize, Serialize};

use super::{SubscriptionStatus, SubscriptionTier};
use crate::domain::foundation::{Timestamp, UserId};

/// Provider subscription narrowed to the fields reconciliation reads.
///
/// Everything is optional here because vendor payloads are untrusted.
/// Required-field checks happen in the reconciler, before any write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSubscription {
    /// Provider subscription id (sub_xxx).
    pub id: String,
    /// Raw provider status string.
    pub status: String,
    /// Price id of the first subscription item.
    pub price_id: Option<String>,
    pub current_period_start: Option<Timestamp>,
    pub current_period_end: Option<Timestamp>,
    pub trial_start: Option<Timestamp>,
    pub trial_end: Option<Timestamp>,
    /// Owner, from the `supabase_user_id` metadata key.
    pub user_id: Option<String>,
}

impl ProviderSubscription {
    /// Canonical status for the raw provider string.
    pub fn canonical_status(&self) -> SubscriptionStatus {
        SubscriptionStatus::from_provider(&self.status)
    }
}

/// Persisted subscription, one per `provider_subscription_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub user_id: UserId,
    pub provider_subscription_id: String,
    pub provider_price_id: Option<String>,
    pub status: SubscriptionStatus,
    pub current_period_start: Timestamp,
    pub current_period_end: Timestamp,
    pub trial_start: Option<Timestamp>,
    pub trial_end: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SubscriptionRecord {
    /// Tier implied by the stored status.
    pub fn tier(&self) -> SubscriptionTier {
        self.status.tier()
    }
}

/// The `(status, tier)` pair held on a user access record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub status: SubscriptionStatus,
    pub tier: SubscriptionTier,
}

impl StatusSnapshot {
    /// Snapshot for a status, with the tier derived from it.
    pub fn for_status(status: SubscriptionStatus) -> Self {
        Self {
            status,
            tier: status.tier(),
        }
    }

    /// Default for a user with no access record.
    pub fn free() -> Self {
        Self::for_status(SubscriptionStatus::Free)
    }

    /// Fallback when a lookup fails or times out.
    pub fn inactive() -> Self {
        Self::for_status(SubscriptionStatus::Inactive)
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}
