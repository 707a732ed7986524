//! PostgreSQL implementation of UserAccessRepository.
//!
//! The `user_access` row is created at signup; this adapter only updates
//! and reads it.

use async_trait::async_trait;
use sqlx::PgPool;

use super::errors::{database_error, parse_user_id_as_uuid};
use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::domain::subscription::{StatusSnapshot, SubscriptionStatus, SubscriptionTier};
use crate::ports::UserAccessRepository;

/// PostgreSQL implementation of the UserAccessRepository port.
pub struct PostgresUserAccessRepository {
    pool: PgPool,
}

impl PostgresUserAccessRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserAccessRow {
    subscription_status: String,
    subscription_tier: String,
}

impl From<UserAccessRow> for StatusSnapshot {
    fn from(row: UserAccessRow) -> Self {
        StatusSnapshot {
            status: SubscriptionStatus::from_stored(&row.subscription_status),
            tier: SubscriptionTier::from_stored(&row.subscription_tier),
        }
    }
}

#[async_trait]
impl UserAccessRepository for PostgresUserAccessRepository {
    async fn update_status(
        &self,
        user_id: &UserId,
        snapshot: StatusSnapshot,
    ) -> Result<(), DomainError> {
        let user_uuid = parse_user_id_as_uuid(user_id)?;

        let result = sqlx::query(
            r#"
            UPDATE user_access SET
                subscription_status = $2,
                subscription_tier = $3,
                updated_at = NOW()
            WHERE user_id = $1
            "#,
        )
        .bind(user_uuid)
        .bind(snapshot.status.as_str())
        .bind(snapshot.tier.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| database_error("update user status", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::UserNotFound,
                format!("No access record for user {}", user_id),
            )
            .with_detail("user_id", user_id.as_str()));
        }

        Ok(())
    }

    async fn find_status(&self, user_id: &UserId) -> Result<Option<StatusSnapshot>, DomainError> {
        let user_uuid = parse_user_id_as_uuid(user_id)?;

        let row: Option<UserAccessRow> = sqlx::query_as(
            r#"
            SELECT subscription_status, subscription_tier
            FROM user_access
            WHERE user_id = $1
            "#,
        )
        .bind(user_uuid)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("read user status", e))?;

        Ok(row.map(StatusSnapshot::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_defaults_read_as_free() {
        let snapshot = StatusSnapshot::from(UserAccessRow {
            subscription_status: "free".to_string(),
            subscription_tier: "free".to_string(),
        });
        assert_eq!(snapshot, StatusSnapshot::free());
    }

    #[test]
    fn projected_row_reads_back() {
        let snapshot = StatusSnapshot::from(UserAccessRow {
            subscription_status: "trialing".to_string(),
            subscription_tier: "pro".to_string(),
        });
        assert_eq!(snapshot.status, SubscriptionStatus::Trialing);
        assert_eq!(snapshot.tier, SubscriptionTier::Pro);
        assert!(snapshot.is_active());
    }
}
