//! Reconciliation error types.

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::subscription::stripe_event::USER_ID_METADATA_KEY;
use crate::ports::{PaymentError, PaymentErrorCode};

/// How a reconciliation failure is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileErrorKind {
    /// Payload is missing something reconciliation needs.
    Data,
    /// Payload does not name a user the store can attribute the
    /// subscription to.
    Attribution,
    /// Store or provider call failed.
    Transient,
}

impl ReconcileErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileErrorKind::Data => "data",
            ReconcileErrorKind::Attribution => "attribution",
            ReconcileErrorKind::Transient => "transient",
        }
    }
}

/// Errors that abort reconciliation of a verified event.
///
/// None of these reach the provider: the webhook is acknowledged either way.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Missing {} metadata", USER_ID_METADATA_KEY)]
    MissingAttribution,

    #[error("Malformed event object: {0}")]
    MalformedPayload(String),

    #[error("Subscription {0} not found at provider")]
    SubscriptionNotFound(String),

    #[error("Provider error: {0}")]
    Provider(#[from] PaymentError),

    #[error("Store error: {0}")]
    Store(#[from] DomainError),
}

impl ReconcileError {
    pub fn kind(&self) -> ReconcileErrorKind {
        match self {
            ReconcileError::MissingField(_)
            | ReconcileError::MalformedPayload(_)
            | ReconcileError::SubscriptionNotFound(_) => ReconcileErrorKind::Data,
            ReconcileError::MissingAttribution => ReconcileErrorKind::Attribution,
            ReconcileError::Provider(err) if err.code == PaymentErrorCode::InvalidRequest => {
                ReconcileErrorKind::Data
            }
            // The store rejected the owner id.
            ReconcileError::Store(err) if err.code == ErrorCode::ValidationFailed => {
                ReconcileErrorKind::Attribution
            }
            ReconcileError::Provider(_) | ReconcileError::Store(_) => ReconcileErrorKind::Transient,
        }
    }

    /// Backend error code for transient failures, `"none"` otherwise.
    pub fn error_code(&self) -> String {
        match self {
            ReconcileError::Provider(err) => err.code.to_string(),
            ReconcileError::Store(err) => err.db_code().to_string(),
            _ => "none".to_string(),
        }
    }

    /// Backend hint for transient failures, `"none"` otherwise.
    pub fn hint(&self) -> &str {
        match self {
            ReconcileError::Provider(err) => err.provider_code_or_none(),
            ReconcileError::Store(err) => err.hint(),
            _ => "none",
        }
    }
}
