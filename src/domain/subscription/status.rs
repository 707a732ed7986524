//! Subscription status as mirrored from the payment provider.
//!
//! The provider's status vocabulary is open-ended. Everything it can say is
//! folded onto a closed enum here, and every status maps to exactly one tier.

use serde::{Deserialize, Serialize};

use super::SubscriptionTier;

/// Canonical subscription status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// In a free trial period.
    Trialing,

    /// Paid and current.
    Active,

    /// Latest renewal failed; provider is retrying.
    PastDue,

    /// Subscription ended by the customer or the provider.
    Canceled,

    /// Retries exhausted without payment.
    Unpaid,

    /// First payment has not completed.
    Incomplete,

    /// First payment never completed within the provider's window.
    IncompleteExpired,

    /// Status the provider reported that we do not recognize, or the
    /// fallback when a user's status could not be read.
    Inactive,

    /// The user never subscribed. Only ever held on user access records,
    /// never on subscription rows.
    Free,
}

impl SubscriptionStatus {
    /// Maps a provider status string onto the canonical enum.
    ///
    /// Total: anything unrecognized becomes `Inactive`. Never yields `Free`.
    pub fn from_provider(status: &str) -> Self {
        match status {
            "trialing" => SubscriptionStatus::Trialing,
            "active" => SubscriptionStatus::Active,
            "past_due" => SubscriptionStatus::PastDue,
            "canceled" => SubscriptionStatus::Canceled,
            "unpaid" => SubscriptionStatus::Unpaid,
            "incomplete" => SubscriptionStatus::Incomplete,
            "incomplete_expired" => SubscriptionStatus::IncompleteExpired,
            _ => SubscriptionStatus::Inactive,
        }
    }

    /// Parses a value read back from the store.
    pub fn from_stored(status: &str) -> Self {
        match status {
            "free" => SubscriptionStatus::Free,
            other => Self::from_provider(other),
        }
    }

    /// Stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::Unpaid => "unpaid",
            SubscriptionStatus::Incomplete => "incomplete",
            SubscriptionStatus::IncompleteExpired => "incomplete_expired",
            SubscriptionStatus::Inactive => "inactive",
            SubscriptionStatus::Free => "free",
        }
    }

    /// Tier implied by this status.
    ///
    /// `PastDue` keeps `Pro` so a failed renewal does not strip features
    /// while the provider retries.
    pub fn tier(&self) -> SubscriptionTier {
        match self {
            SubscriptionStatus::Trialing
            | SubscriptionStatus::Active
            | SubscriptionStatus::PastDue => SubscriptionTier::Pro,
            SubscriptionStatus::Canceled
            | SubscriptionStatus::Unpaid
            | SubscriptionStatus::Incomplete
            | SubscriptionStatus::IncompleteExpired
            | SubscriptionStatus::Inactive
            | SubscriptionStatus::Free => SubscriptionTier::Free,
        }
    }

    /// Returns true if this status unlocks gated views.
    ///
    /// Stricter than [`tier`](Self::tier): `PastDue` is `Pro` but not active.
    pub fn is_active(&self) -> bool {
        matches!(self, SubscriptionStatus::Active | SubscriptionStatus::Trialing)
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
