//! PostgreSQL implementation of SubscriptionRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::errors::{database_error, parse_user_id_as_uuid};
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::domain::subscription::{SubscriptionRecord, SubscriptionStatus};
use crate::ports::SubscriptionRepository;

/// PostgreSQL implementation of the SubscriptionRepository port.
pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a subscription.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    user_id: Uuid,
    provider_subscription_id: String,
    provider_price_id: Option<String>,
    status: String,
    current_period_start: DateTime<Utc>,
    current_period_end: DateTime<Utc>,
    trial_start: Option<DateTime<Utc>>,
    trial_end: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for SubscriptionRecord {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(SubscriptionRecord {
            user_id: UserId::new(row.user_id.to_string()).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid user_id: {}", e))
            })?,
            provider_subscription_id: row.provider_subscription_id,
            provider_price_id: row.provider_price_id,
            status: SubscriptionStatus::from_stored(&row.status),
            current_period_start: Timestamp::from_datetime(row.current_period_start),
            current_period_end: Timestamp::from_datetime(row.current_period_end),
            trial_start: row.trial_start.map(Timestamp::from_datetime),
            trial_end: row.trial_end.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn upsert(&self, record: &SubscriptionRecord) -> Result<(), DomainError> {
        let user_uuid = parse_user_id_as_uuid(&record.user_id)?;

        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                user_id, provider_subscription_id, provider_price_id, status,
                current_period_start, current_period_end, trial_start, trial_end,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (provider_subscription_id) DO UPDATE SET
                user_id = EXCLUDED.user_id,
                provider_price_id = EXCLUDED.provider_price_id,
                status = EXCLUDED.status,
                current_period_start = EXCLUDED.current_period_start,
                current_period_end = EXCLUDED.current_period_end,
                trial_start = EXCLUDED.trial_start,
                trial_end = EXCLUDED.trial_end,
                updated_at = NOW()
            "#,
        )
        .bind(user_uuid)
        .bind(&record.provider_subscription_id)
        .bind(&record.provider_price_id)
        .bind(record.status.as_str())
        .bind(record.current_period_start.as_datetime())
        .bind(record.current_period_end.as_datetime())
        .bind(record.trial_start.map(|t| *t.as_datetime()))
        .bind(record.trial_end.map(|t| *t.as_datetime()))
        .bind(record.created_at.as_datetime())
        .bind(record.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| database_error("upsert subscription", e))?;

        Ok(())
    }

    async fn find_latest_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        let user_uuid = parse_user_id_as_uuid(user_id)?;

        let row: Option<SubscriptionRow> = sqlx::query_as(
            r#"
            SELECT user_id, provider_subscription_id, provider_price_id, status,
                   current_period_start, current_period_end, trial_start, trial_end,
                   created_at, updated_at
            FROM subscriptions
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_uuid)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("find latest subscription", e))?;

        row.map(SubscriptionRecord::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(status: &str) -> SubscriptionRow {
        let start = Utc.timestamp_opt(1_704_067_200, 0).unwrap();
        let end = Utc.timestamp_opt(1_706_745_600, 0).unwrap();
        SubscriptionRow {
            user_id: Uuid::parse_str("5d0c6a8e-7f5b-4c43-9d8a-1b2c3d4e5f60").unwrap(),
            provider_subscription_id: "sub_123".to_string(),
            provider_price_id: Some("price_pro".to_string()),
            status: status.to_string(),
            current_period_start: start,
            current_period_end: end,
            trial_start: None,
            trial_end: None,
            created_at: start,
            updated_at: start,
        }
    }

    #[test]
    fn row_converts_to_record() {
        let record = SubscriptionRecord::try_from(row("past_due")).unwrap();
        assert_eq!(record.status, SubscriptionStatus::PastDue);
        assert_eq!(record.user_id.as_str(), "5d0c6a8e-7f5b-4c43-9d8a-1b2c3d4e5f60");
        assert_eq!(record.current_period_end.as_unix_secs(), 1_706_745_600);
    }

    #[test]
    fn unknown_stored_status_reads_as_inactive() {
        let record = SubscriptionRecord::try_from(row("paused")).unwrap();
        assert_eq!(record.status, SubscriptionStatus::Inactive);
    }
}
