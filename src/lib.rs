//! Podcast Billing - subscription reconciliation and access gating
//!
//! Stripe webhooks are verified against the raw request body, narrowed to a
//! small set of billing events, and reconciled into one subscription row per
//! provider subscription. Each reconciliation mirrors the canonical
//! `(status, tier)` pair onto the owning user's access record, which the
//! status facade and the access gate read.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
