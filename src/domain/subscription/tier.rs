//! Subscription tier definitions.

use serde::{Deserialize, Serialize};

/// Access tier derived from a subscription status.
///
/// Never stored independently of status: it is always recomputed through
/// [`SubscriptionStatus::tier`](super::SubscriptionStatus::tier).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    /// No premium features.
    Free,

    /// Premium podcast tooling.
    Pro,
}

impl SubscriptionTier {
    /// Stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Pro => "pro",
        }
    }

    /// Parses the stored string form. Unknown values read as `Free`.
    pub fn from_stored(value: &str) -> Self {
        match value {
            "pro" => SubscriptionTier::Pro,
            _ => SubscriptionTier::Free,
        }
    }
}

impl std::fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
