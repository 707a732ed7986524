//! Stripe billing provider adapter.
//!
//! Implements `BillingProvider` over the Stripe REST API. Only the live
//! subscription lookup is needed: invoice and checkout webhooks reference a
//! subscription by id and reconciliation re-fetches it here.
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeConfig::new(api_key).with_timeout(Duration::from_secs(10));
//! let adapter = StripeBillingAdapter::new(config)?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::subscription::{ProviderSubscription, StripeSubscriptionObject};
use crate::ports::{BillingProvider, PaymentError, PaymentErrorCode};

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Base URL for Stripe API (default: https://api.stripe.com).
    api_base_url: String,

    /// Client-level timeout for each request.
    timeout: Duration,
}

impl StripeConfig {
    /// Create a new Stripe configuration.
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            api_base_url: "https://api.stripe.com".to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Stripe error body: `{"error": {"code": ..., "message": ...}}`.
#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorBody,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Stripe billing provider adapter.
pub struct StripeBillingAdapter {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripeBillingAdapter {
    /// Create a new Stripe adapter with the given configuration.
    pub fn new(config: StripeConfig) -> Result<Self, PaymentError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PaymentError::provider(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn subscription_url(&self, subscription_id: &str) -> String {
        format!(
            "{}/v1/subscriptions/{}",
            self.config.api_base_url.trim_end_matches('/'),
            subscription_id
        )
    }
}

/// Stripe object ids are `[A-Za-z0-9_]+`; anything else never reaches the
/// request path.
fn is_valid_subscription_id(subscription_id: &str) -> bool {
    !subscription_id.is_empty()
        && subscription_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Maps a non-success Stripe response onto a payment error.
fn error_from_response(status: reqwest::StatusCode, body: &str) -> PaymentError {
    let code = match status {
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
            PaymentErrorCode::AuthenticationError
        }
        reqwest::StatusCode::TOO_MANY_REQUESTS => PaymentErrorCode::RateLimitExceeded,
        _ => PaymentErrorCode::ProviderError,
    };

    match serde_json::from_str::<StripeErrorEnvelope>(body) {
        Ok(envelope) => {
            let message = envelope
                .error
                .message
                .unwrap_or_else(|| format!("Stripe API error ({})", status));
            let err = PaymentError::new(code, message);
            match envelope.error.code {
                Some(provider_code) => err.with_provider_code(provider_code),
                None => err,
            }
        }
        Err(_) => PaymentError::new(code, format!("Stripe API error ({}): {}", status, body)),
    }
}

#[async_trait]
impl BillingProvider for StripeBillingAdapter {
    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<ProviderSubscription>, PaymentError> {
        if !is_valid_subscription_id(subscription_id) {
            return Err(PaymentError::new(
                PaymentErrorCode::InvalidRequest,
                format!("Malformed subscription id: {:?}", subscription_id),
            ));
        }

        let response = self
            .http_client
            .get(self.subscription_url(subscription_id))
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!(subscription_id, "Stripe has no such subscription");
            return Ok(None);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_response(status, &body));
        }

        let subscription: StripeSubscriptionObject = response.json().await.map_err(|e| {
            PaymentError::new(
                PaymentErrorCode::InvalidResponse,
                format!("Failed to parse Stripe response: {}", e),
            )
        })?;

        Ok(Some(subscription.into_provider_subscription()))
    }
}
