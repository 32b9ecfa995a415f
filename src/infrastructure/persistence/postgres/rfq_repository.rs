//! # PostgreSQL RFQ Repository

use super::{cas_miss, map_sqlx_error, to_db_version};
use crate::domain::entities::rfq::Rfq;
use crate::domain::value_objects::RfqId;
use crate::infrastructure::persistence::traits::{RepositoryResult, RfqFilter, RfqRepository};
use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;

/// PostgreSQL implementation of [`RfqRepository`].
///
/// # Examples
///
/// ```ignore
/// use sqlx::PgPool;
/// use procurement_engine::infrastructure::persistence::postgres::PostgresRfqRepository;
///
/// let pool = PgPool::connect("postgres://...").await?;
/// let rfqs = PostgresRfqRepository::new(pool);
/// ```
#[derive(Debug, Clone)]
pub struct PostgresRfqRepository {
    pool: PgPool,
}

impl PostgresRfqRepository {
    /// Creates a repository over `pool`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn current_version(&self, id: &RfqId) -> RepositoryResult<Option<i64>> {
        sqlx::query_scalar("SELECT version FROM rfqs WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "RFQ", id))
    }
}

#[async_trait]
impl RfqRepository for PostgresRfqRepository {
    async fn insert(&self, rfq: &Rfq) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO rfqs (id, company_id, status, version, created_at, document)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(rfq.id().as_uuid())
        .bind(rfq.company_id().as_str())
        .bind(rfq.status().to_string())
        .bind(to_db_version(rfq.version())?)
        .bind(rfq.created_at().as_datetime())
        .bind(Json(rfq))
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "RFQ", rfq.id()))?;
        Ok(())
    }

    async fn update(&self, rfq: &Rfq, expected_version: u64) -> RepositoryResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE rfqs
            SET status = $3, version = $4, document = $5
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(rfq.id().as_uuid())
        .bind(to_db_version(expected_version)?)
        .bind(rfq.status().to_string())
        .bind(to_db_version(rfq.version())?)
        .bind(Json(rfq))
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "RFQ", rfq.id()))?;

        if result.rows_affected() == 0 {
            let actual = self.current_version(&rfq.id()).await?;
            return Err(cas_miss("RFQ", rfq.id(), expected_version, actual));
        }
        Ok(())
    }

    async fn get(&self, id: &RfqId) -> RepositoryResult<Option<Rfq>> {
        let row: Option<Json<Rfq>> = sqlx::query_scalar("SELECT document FROM rfqs WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "RFQ", id))?;
        Ok(row.map(|Json(rfq)| rfq))
    }

    async fn list(&self, filter: &RfqFilter) -> RepositoryResult<Vec<Rfq>> {
        let rows: Vec<Json<Rfq>> = sqlx::query_scalar(
            r#"
            SELECT document FROM rfqs
            WHERE ($1::text IS NULL OR company_id = $1)
              AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(filter.company_id.as_ref().map(|c| c.as_str().to_string()))
        .bind(filter.status.map(|s| s.to_string()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "RFQ", "list"))?;
        Ok(rows.into_iter().map(|Json(rfq)| rfq).collect())
    }
}
