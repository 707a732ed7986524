//! User access repository port.
//!
//! One access record per auth identity, created at signup with free
//! defaults. Only the status projector writes to it.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::subscription::StatusSnapshot;

/// Repository port for user access records.
#[async_trait]
pub trait UserAccessRepository: Send + Sync {
    /// Overwrite the user's status and tier.
    ///
    /// # Errors
    ///
    /// - `UserNotFound` if the user has no access record
    /// - `DatabaseError` on persistence failure
    async fn update_status(&self, user_id: &UserId, snapshot: StatusSnapshot)
        -> Result<(), DomainError>;

    /// Read the user's status and tier. `Ok(None)` when no record exists.
    async fn find_status(&self, user_id: &UserId) -> Result<Option<StatusSnapshot>, DomainError>;
}
