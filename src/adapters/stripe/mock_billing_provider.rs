//! Mock billing provider for testing.
//!
//! Supports pre-configured subscriptions, error injection and call tracking.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::subscription::ProviderSubscription;
use crate::ports::{BillingProvider, PaymentError};

/// Mock billing provider for testing.
///
/// # Example
///
/// ```ignore
/// let mock = MockBillingProvider::new();
/// mock.set_subscription(live_subscription("sub_456", "past_due"));
///
/// let sub = mock.get_subscription("sub_456").await?;
/// assert_eq!(mock.calls(), vec!["sub_456".to_string()]);
/// ```
#[derive(Default, Clone)]
pub struct MockBillingProvider {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    /// Pre-configured subscriptions by ID.
    subscriptions: HashMap<String, ProviderSubscription>,

    /// Error returned by every call while set.
    error: Option<PaymentError>,

    /// Subscription ids requested, in order.
    call_log: Vec<String>,
}

impl MockBillingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Makes a subscription fetchable by its id.
    pub fn set_subscription(&self, subscription: ProviderSubscription) {
        self.state()
            .subscriptions
            .insert(subscription.id.clone(), subscription);
    }

    /// Fail every lookup with the given error.
    pub fn set_error(&self, error: PaymentError) {
        self.state().error = Some(error);
    }

    pub fn clear_error(&self) {
        self.state().error = None;
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Assertions
    // ════════════════════════════════════════════════════════════════════════════

    /// Subscription ids requested so far.
    pub fn calls(&self) -> Vec<String> {
        self.state().call_log.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state().call_log.len()
    }
}

#[async_trait]
impl BillingProvider for MockBillingProvider {
    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<ProviderSubscription>, PaymentError> {
        let mut state = self.state();
        state.call_log.push(subscription_id.to_string());

        if let Some(err) = state.error.clone() {
            return Err(err);
        }

        Ok(state.subscriptions.get(subscription_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscription(id: &str) -> ProviderSubscription {
        ProviderSubscription {
            id: id.to_string(),
            status: "active".to_string(),
            price_id: None,
            current_period_start: None,
            current_period_end: None,
            trial_start: None,
            trial_end: None,
            user_id: None,
        }
    }

    #[tokio::test]
    async fn returns_configured_subscription_and_logs_call() {
        let mock = MockBillingProvider::new();
        mock.set_subscription(subscription("sub_1"));

        let found = mock.get_subscription("sub_1").await.unwrap();
        let missing = mock.get_subscription("sub_2").await.unwrap();

        assert_eq!(found.map(|s| s.id), Some("sub_1".to_string()));
        assert!(missing.is_none());
        assert_eq!(mock.calls(), vec!["sub_1".to_string(), "sub_2".to_string()]);
    }

    #[tokio::test]
    async fn injected_error_is_returned_until_cleared() {
        let mock = MockBillingProvider::new();
        mock.set_subscription(subscription("sub_1"));
        mock.set_error(PaymentError::network("timeout"));

        assert!(mock.get_subscription("sub_1").await.is_err());

        mock.clear_error();
        assert!(mock.get_subscription("sub_1").await.unwrap().is_some());
    }
}
