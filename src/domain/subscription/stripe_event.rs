//! Stripe webhook event types.
//!
//! The envelope is parsed loosely, then narrowed into a [`BillingEvent`]
//! straight after signature verification. Nothing downstream touches the
//! raw vendor JSON.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::ProviderSubscription;
use crate::domain::foundation::Timestamp;

/// Metadata key under which checkout attaches the owning user id.
pub const USER_ID_METADATA_KEY: &str = "supabase_user_id";

/// Stripe webhook event envelope (simplified).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEvent {
    /// Unique identifier for the event (evt_xxx format).
    pub id: String,

    /// Type of event (e.g., "customer.subscription.updated").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Time at which the event was created (Unix timestamp).
    #[serde(default)]
    pub created: i64,

    /// Object containing event-specific data.
    pub data: StripeEventData,

    #[serde(default)]
    pub livemode: bool,

    #[serde(default)]
    pub api_version: Option<String>,
}

/// Container for event-specific data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEventData {
    /// The object that triggered the event (polymorphic based on event type).
    pub object: serde_json::Value,
}

impl StripeEvent {
    /// Parse the event type into a known enum variant.
    pub fn parsed_type(&self) -> StripeEventType {
        StripeEventType::from_str(&self.event_type)
    }

    /// Attempts to deserialize the data object as the specified type.
    pub fn deserialize_object<T: serde::de::DeserializeOwned>(
        &self,
    ) -> Result<T, serde_json::Error> {
        T::deserialize(&self.data.object)
    }
}

/// Stripe event types that drive reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripeEventType {
    CustomerSubscriptionCreated,
    CustomerSubscriptionUpdated,
    CustomerSubscriptionDeleted,
    InvoicePaymentSucceeded,
    InvoicePaymentFailed,
    CheckoutSessionCompleted,
    /// Unknown or unhandled event type.
    Unknown,
}

impl StripeEventType {
    /// Parse event type from string.
    pub fn from_str(s: &str) -> Self {
        match s {
            "customer.subscription.created" => Self::CustomerSubscriptionCreated,
            "customer.subscription.updated" => Self::CustomerSubscriptionUpdated,
            "customer.subscription.deleted" => Self::CustomerSubscriptionDeleted,
            "invoice.payment_succeeded" => Self::InvoicePaymentSucceeded,
            "invoice.payment_failed" => Self::InvoicePaymentFailed,
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            _ => Self::Unknown,
        }
    }

    /// Convert to the Stripe event type string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CustomerSubscriptionCreated => "customer.subscription.created",
            Self::CustomerSubscriptionUpdated => "customer.subscription.updated",
            Self::CustomerSubscriptionDeleted => "customer.subscription.deleted",
            Self::InvoicePaymentSucceeded => "invoice.payment_succeeded",
            Self::InvoicePaymentFailed => "invoice.payment_failed",
            Self::CheckoutSessionCompleted => "checkout.session.completed",
            Self::Unknown => "unknown",
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Wire objects
// ─────────────────────────────────────────────────────────────────

/// Stripe timestamps arrive as epoch seconds; some fixtures and proxies
/// re-serialize them as ISO-8601 strings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum StripeTime {
    Epoch(i64),
    Iso(String),
}

impl StripeTime {
    /// Converts to a timestamp. Unparseable values yield `None`.
    pub fn to_timestamp(&self) -> Option<Timestamp> {
        match self {
            StripeTime::Epoch(secs) => Timestamp::from_unix_secs(*secs),
            StripeTime::Iso(value) => Timestamp::parse_rfc3339(value),
        }
    }
}

/// A field Stripe may send either as an id or as the expanded object.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Expandable {
    Id(String),
    Object { id: String },
}

impl Expandable {
    pub fn id(&self) -> &str {
        match self {
            Expandable::Id(id) => id,
            Expandable::Object { id } => id,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct StripeList<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripePrice {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeSubscriptionItem {
    #[serde(default)]
    pub price: Option<StripePrice>,
    // Newer API versions moved billing periods onto items.
    #[serde(default)]
    pub current_period_start: Option<StripeTime>,
    #[serde(default)]
    pub current_period_end: Option<StripeTime>,
}

/// Stripe subscription object, as carried by `customer.subscription.*`
/// events and returned by `GET /v1/subscriptions/{id}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeSubscriptionObject {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub items: Option<StripeList<StripeSubscriptionItem>>,
    #[serde(default)]
    pub current_period_start: Option<StripeTime>,
    #[serde(default)]
    pub current_period_end: Option<StripeTime>,
    #[serde(default)]
    pub trial_start: Option<StripeTime>,
    #[serde(default)]
    pub trial_end: Option<StripeTime>,
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
}

impl StripeSubscriptionObject {
    fn first_item(&self) -> Option<&StripeSubscriptionItem> {
        self.items.as_ref().and_then(|items| items.data.first())
    }

    /// Narrows the wire object into the provider-neutral form.
    pub fn into_provider_subscription(self) -> ProviderSubscription {
        let item = self.first_item();
        let price_id = item.and_then(|i| i.price.as_ref()).map(|p| p.id.clone());
        let current_period_start = self
            .current_period_start
            .as_ref()
            .or_else(|| item.and_then(|i| i.current_period_start.as_ref()))
            .and_then(StripeTime::to_timestamp);
        let current_period_end = self
            .current_period_end
            .as_ref()
            .or_else(|| item.and_then(|i| i.current_period_end.as_ref()))
            .and_then(StripeTime::to_timestamp);
        let user_id = self
            .metadata
            .as_ref()
            .and_then(|m| m.get(USER_ID_METADATA_KEY))
            .filter(|id| !id.trim().is_empty())
            .cloned();

        ProviderSubscription {
            price_id,
            current_period_start,
            current_period_end,
            trial_start: self.trial_start.as_ref().and_then(StripeTime::to_timestamp),
            trial_end: self.trial_end.as_ref().and_then(StripeTime::to_timestamp),
            user_id,
            status: self.status.unwrap_or_default(),
            id: self.id,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeInvoiceObject {
    pub id: String,
    #[serde(default)]
    pub subscription: Option<Expandable>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeCheckoutSessionObject {
    pub id: String,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub subscription: Option<Expandable>,
}

// ─────────────────────────────────────────────────────────────────
// Narrowed events
// ─────────────────────────────────────────────────────────────────

/// Outcome reported by an invoice event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Succeeded,
    Failed,
}

/// A verified billing event, narrowed to what routing needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingEvent {
    /// `customer.subscription.created` or `.updated`.
    SubscriptionChanged(ProviderSubscription),

    /// `customer.subscription.deleted`.
    SubscriptionDeleted(ProviderSubscription),

    /// `invoice.payment_succeeded` or `invoice.payment_failed`.
    InvoicePayment {
        invoice_id: String,
        subscription_id: Option<String>,
        outcome: PaymentOutcome,
    },

    /// `checkout.session.completed`.
    CheckoutCompleted {
        session_id: String,
        mode: Option<String>,
        subscription_id: Option<String>,
    },

    /// Anything else. Acknowledged and ignored.
    Unrecognized { event_type: String },
}

impl BillingEvent {
    /// Narrows a verified envelope.
    ///
    /// Fails only when the data object for a recognized type does not have
    /// the shape of that type.
    pub fn from_event(event: &StripeEvent) -> Result<Self, serde_json::Error> {
        let narrowed = match event.parsed_type() {
            StripeEventType::CustomerSubscriptionCreated
            | StripeEventType::CustomerSubscriptionUpdated => BillingEvent::SubscriptionChanged(
                event
                    .deserialize_object::<StripeSubscriptionObject>()?
                    .into_provider_subscription(),
            ),
            StripeEventType::CustomerSubscriptionDeleted => BillingEvent::SubscriptionDeleted(
                event
                    .deserialize_object::<StripeSubscriptionObject>()?
                    .into_provider_subscription(),
            ),
            StripeEventType::InvoicePaymentSucceeded | StripeEventType::InvoicePaymentFailed => {
                let invoice: StripeInvoiceObject = event.deserialize_object()?;
                let outcome = if event.parsed_type() == StripeEventType::InvoicePaymentSucceeded {
                    PaymentOutcome::Succeeded
                } else {
                    PaymentOutcome::Failed
                };
                BillingEvent::InvoicePayment {
                    subscription_id: invoice.subscription.map(|s| s.id().to_string()),
                    invoice_id: invoice.id,
                    outcome,
                }
            }
            StripeEventType::CheckoutSessionCompleted => {
                let session: StripeCheckoutSessionObject = event.deserialize_object()?;
                BillingEvent::CheckoutCompleted {
                    subscription_id: session.subscription.map(|s| s.id().to_string()),
                    session_id: session.id,
                    mode: session.mode,
                }
            }
            StripeEventType::Unknown => BillingEvent::Unrecognized {
                event_type: event.event_type.clone(),
            },
        };
        Ok(narrowed)
    }
}

/// Builder for creating test StripeEvent instances.
#[cfg(test)]
pub struct StripeEventBuilder {
    id: String,
    event_type: String,
    object: serde_json::Value,
}

#[cfg(test)]
impl StripeEventBuilder {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            id: "evt_test_123".to_string(),
            event_type: event_type.into(),
            object: serde_json::json!({}),
        }
    }

    pub fn object(mut self, object: serde_json::Value) -> Self {
        self.object = object;
        self
    }

    pub fn build(self) -> StripeEvent {
        StripeEvent {
            id: self.id,
            event_type: self.event_type,
            created: chrono::Utc::now().timestamp(),
            data: StripeEventData {
                object: self.object,
            },
            livemode: false,
            api_version: Some("2023-10-16".to_string()),
        }
    }
}
