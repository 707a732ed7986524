//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `subscription` - Provider subscription state and webhook verification
//! - `access` - Access gate lifecycle

pub mod access;
pub mod foundation;
pub mod subscription;
