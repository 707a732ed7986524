//! sqlx error translation.
//!
//! Every store failure leaves this module as a `DomainError` carrying the
//! Postgres SQLSTATE under `db_code` and the server hint under `hint`, when
//! the server sent them.

use sqlx::postgres::PgDatabaseError;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, UserId};

/// Wraps a sqlx error with the operation that failed.
pub(crate) fn database_error(operation: &str, err: sqlx::Error) -> DomainError {
    let mut domain = DomainError::new(
        ErrorCode::DatabaseError,
        format!("Failed to {}: {}", operation, err),
    );

    match &err {
        sqlx::Error::Database(db_err) => {
            if let Some(code) = db_err.code() {
                domain = domain.with_detail("db_code", code.to_string());
            }
            if let Some(hint) = db_err
                .try_downcast_ref::<PgDatabaseError>()
                .and_then(PgDatabaseError::hint)
            {
                domain = domain.with_detail("hint", hint);
            }
        }
        sqlx::Error::PoolTimedOut => {
            domain = domain.with_detail("hint", "connection pool exhausted");
        }
        sqlx::Error::RowNotFound => {
            domain = domain.with_detail("hint", "expected exactly one row");
        }
        _ => {}
    }

    domain
}

/// User ids are auth-provider UUIDs in the database.
pub(crate) fn parse_user_id_as_uuid(user_id: &UserId) -> Result<Uuid, DomainError> {
    Uuid::parse_str(user_id.as_str()).map_err(|e| {
        DomainError::new(
            ErrorCode::ValidationFailed,
            format!("User ID must be a valid UUID: {}", e),
        )
        .with_detail("user_id", user_id.as_str())
    })
}
