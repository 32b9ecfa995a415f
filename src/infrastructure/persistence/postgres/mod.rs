//! # PostgreSQL Persistence
//!
//! sqlx implementations of the repository ports and the event store.
//!
//! Aggregates are stored as JSONB documents next to the columns queries
//! filter on (`status`, `version`, foreign keys). Every write is a
//! compare-and-swap on the `version` column. Uniqueness rules live in
//! `migrations/0001_procurement.sql`:
//!
//! - one current quotation row per `(rfq_id, supplier_id)`
//! - one accepted quotation row per `(rfq_id, supplier_id)`
//! - one payment per `order_id`
//! - quotations reference an existing RFQ
//!
//! Unique violations surface as [`RepositoryError::Duplicate`].

pub mod acceptance;
pub mod event_store;
pub mod payment_repository;
pub mod quotation_repository;
pub mod rfq_deletion;
pub mod rfq_repository;

pub use acceptance::PostgresAcceptanceUnit;
pub use event_store::PostgresEventStore;
pub use payment_repository::PostgresPaymentRepository;
pub use quotation_repository::PostgresQuotationRepository;
pub use rfq_deletion::PostgresRfqDeletionUnit;
pub use rfq_repository::PostgresRfqRepository;

use crate::config::DatabaseConfig;
use crate::infrastructure::persistence::traits::{RepositoryError, RepositoryResult};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tracing::info;

/// Opens a connection pool sized from `config`.
///
/// # Errors
///
/// Returns `RepositoryError::Connection` if no URL is configured or the
/// database is unreachable.
pub async fn connect(config: &DatabaseConfig) -> RepositoryResult<PgPool> {
    let url = config
        .url
        .as_deref()
        .ok_or_else(|| RepositoryError::connection("database.url is not set"))?;
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_millis(config.acquire_timeout_ms))
        .connect(url)
        .await
        .map_err(|e| RepositoryError::connection(e.to_string()))?;
    info!(max_connections = config.max_connections, "connected to PostgreSQL");
    Ok(pool)
}

/// Applies the bundled migrations.
///
/// # Errors
///
/// Returns `RepositoryError::Query` if a migration fails.
pub async fn run_migrations(pool: &PgPool) -> RepositoryResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| RepositoryError::query(e.to_string()))
}

/// Maps a sqlx error onto the repository error taxonomy.
pub(crate) fn map_sqlx_error(
    err: sqlx::Error,
    entity: &'static str,
    key: impl ToString,
) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::duplicate(entity, key)
        }
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            RepositoryError::connection(err.to_string())
        }
        sqlx::Error::Decode(_) | sqlx::Error::ColumnDecode { .. } => {
            RepositoryError::serialization(err.to_string())
        }
        _ => RepositoryError::query(err.to_string()),
    }
}

/// Returns true if `err` is a foreign key violation.
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

/// Converts an aggregate version into the `BIGINT` column type.
pub(crate) fn to_db_version(version: u64) -> RepositoryResult<i64> {
    i64::try_from(version)
        .map_err(|_| RepositoryError::internal(format!("version {version} exceeds BIGINT")))
}

/// Builds the error for a compare-and-swap that matched no row.
///
/// `actual` is the row's current version, or `None` if it is gone.
pub(crate) fn cas_miss(
    entity: &'static str,
    id: impl ToString,
    expected: u64,
    actual: Option<i64>,
) -> RepositoryError {
    match actual {
        Some(actual) => RepositoryError::version_conflict(
            entity,
            id,
            expected,
            u64::try_from(actual).unwrap_or_default(),
        ),
        None => RepositoryError::not_found(entity, id),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn pool_errors_are_transient() {
        let err = map_sqlx_error(sqlx::Error::PoolTimedOut, "RFQ", "x");
        assert!(err.is_transient());
        let err = map_sqlx_error(sqlx::Error::RowNotFound, "RFQ", "x");
        assert!(!err.is_transient());
        assert!(!is_foreign_key_violation(&sqlx::Error::RowNotFound));
    }

    #[test]
    fn cas_miss_distinguishes_missing_rows() {
        assert!(cas_miss("RFQ", "x", 1, None).is_not_found());
        assert!(cas_miss("RFQ", "x", 1, Some(3)).is_version_conflict());
    }

    #[test]
    fn versions_fit_bigint() {
        assert_eq!(to_db_version(7).unwrap(), 7);
        assert!(to_db_version(u64::MAX).is_err());
    }
}
