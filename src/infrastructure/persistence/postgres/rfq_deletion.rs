//! # PostgreSQL RFQ Deletion Unit

use super::{cas_miss, is_foreign_key_violation, map_sqlx_error, to_db_version};
use crate::domain::value_objects::RfqId;
use crate::infrastructure::persistence::traits::{
    RepositoryError, RepositoryResult, RfqDeletionUnit,
};
use async_trait::async_trait;
use sqlx::PgPool;

/// Deletes an RFQ with one conditional `DELETE`.
///
/// A quotation inserted concurrently locks the RFQ row through its foreign
/// key; the delete then waits for it and fails the foreign key check
/// instead of orphaning the row.
#[derive(Debug, Clone)]
pub struct PostgresRfqDeletionUnit {
    pool: PgPool,
}

impl PostgresRfqDeletionUnit {
    /// Creates a unit over `pool`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn explain_miss(&self, id: &RfqId, expected_version: u64) -> RepositoryResult<RepositoryError> {
        let row: Option<(i64, i64)> = sqlx::query_as(
            r#"
            SELECT version, (SELECT COUNT(*) FROM quotations WHERE rfq_id = $1)
            FROM rfqs WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "RFQ", id))?;

        Ok(match row {
            Some((version, references))
                if u64::try_from(version).is_ok_and(|v| v == expected_version) =>
            {
                RepositoryError::referenced("RFQ", id, u64::try_from(references).unwrap_or(1))
            }
            other => cas_miss("RFQ", id, expected_version, other.map(|(version, _)| version)),
        })
    }
}

#[async_trait]
impl RfqDeletionUnit for PostgresRfqDeletionUnit {
    async fn delete_unquoted(&self, id: &RfqId, expected_version: u64) -> RepositoryResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM rfqs
            WHERE id = $1 AND version = $2
              AND NOT EXISTS (SELECT 1 FROM quotations WHERE rfq_id = $1)
            "#,
        )
        .bind(id.as_uuid())
        .bind(to_db_version(expected_version)?)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                return RepositoryError::referenced("RFQ", id, 1);
            }
            map_sqlx_error(e, "RFQ", id)
        })?;

        if result.rows_affected() == 0 {
            return Err(self.explain_miss(id, expected_version).await?);
        }
        Ok(())
    }
}
