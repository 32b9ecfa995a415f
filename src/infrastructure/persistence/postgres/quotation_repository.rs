//! # PostgreSQL Quotation Repository
//!
//! Chain operations run in one transaction. A revision clears the old
//! row's `is_current` before inserting the new row so the partial unique
//! index never sees two current rows.

use super::{cas_miss, is_foreign_key_violation, map_sqlx_error, to_db_version};
use crate::domain::entities::quotation::Quotation;
use crate::domain::value_objects::{QuotationId, RfqId, SupplierId};
use crate::infrastructure::persistence::traits::{
    QuotationFilter, QuotationRepository, RepositoryError, RepositoryResult,
};
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

/// PostgreSQL implementation of [`QuotationRepository`].
#[derive(Debug, Clone)]
pub struct PostgresQuotationRepository {
    pool: PgPool,
}

impl PostgresQuotationRepository {
    /// Creates a repository over `pool`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn current_version(conn: &mut PgConnection, id: QuotationId) -> RepositoryResult<Option<i64>> {
    sqlx::query_scalar("SELECT version FROM quotations WHERE id = $1")
        .bind(id.as_uuid())
        .fetch_optional(conn)
        .await
        .map_err(|e| map_sqlx_error(e, "Quotation", id))
}

pub(crate) async fn insert_row(conn: &mut PgConnection, quotation: &Quotation) -> RepositoryResult<()> {
    sqlx::query(
        r#"
        INSERT INTO quotations (
            id, rfq_id, supplier_id, status, is_current,
            version_number, version, created_at, document
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(quotation.id().as_uuid())
    .bind(quotation.rfq_id().as_uuid())
    .bind(quotation.supplier_id().as_str())
    .bind(quotation.status().to_string())
    .bind(quotation.is_current())
    .bind(i64::from(quotation.version_number()))
    .bind(to_db_version(quotation.version())?)
    .bind(quotation.created_at().as_datetime())
    .bind(Json(quotation))
    .execute(conn)
    .await
    .map_err(|e| {
        if is_foreign_key_violation(&e) {
            return RepositoryError::not_found("RFQ", quotation.rfq_id());
        }
        map_sqlx_error(
            e,
            "Quotation",
            format!("{}/{}", quotation.rfq_id(), quotation.supplier_id()),
        )
    })?;
    Ok(())
}

/// Compare-and-swap write of one quotation row.
pub(crate) async fn update_row(
    conn: &mut PgConnection,
    quotation: &Quotation,
    expected_version: u64,
) -> RepositoryResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE quotations
        SET status = $3, is_current = $4, version = $5, document = $6
        WHERE id = $1 AND version = $2
        "#,
    )
    .bind(quotation.id().as_uuid())
    .bind(to_db_version(expected_version)?)
    .bind(quotation.status().to_string())
    .bind(quotation.is_current())
    .bind(to_db_version(quotation.version())?)
    .bind(Json(quotation))
    .execute(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error(e, "Quotation", quotation.id()))?;

    if result.rows_affected() == 0 {
        let actual = current_version(conn, quotation.id()).await?;
        return Err(cas_miss("Quotation", quotation.id(), expected_version, actual));
    }
    Ok(())
}

fn begin_error(e: sqlx::Error) -> RepositoryError {
    map_sqlx_error(e, "Quotation", "transaction")
}

#[async_trait]
impl QuotationRepository for PostgresQuotationRepository {
    async fn insert(&self, quotation: &Quotation) -> RepositoryResult<()> {
        let mut conn = self.pool.acquire().await.map_err(begin_error)?;
        insert_row(&mut conn, quotation).await
    }

    async fn update(&self, quotation: &Quotation, expected_version: u64) -> RepositoryResult<()> {
        let mut conn = self.pool.acquire().await.map_err(begin_error)?;
        update_row(&mut conn, quotation, expected_version).await
    }

    async fn get(&self, id: &QuotationId) -> RepositoryResult<Option<Quotation>> {
        let row: Option<Json<Quotation>> =
            sqlx::query_scalar("SELECT document FROM quotations WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_sqlx_error(e, "Quotation", id))?;
        Ok(row.map(|Json(q)| q))
    }

    async fn list(&self, filter: &QuotationFilter) -> RepositoryResult<Vec<Quotation>> {
        let rows: Vec<Json<Quotation>> = sqlx::query_scalar(
            r#"
            SELECT document FROM quotations
            WHERE ($1::uuid IS NULL OR rfq_id = $1)
              AND ($2::text IS NULL OR supplier_id = $2)
              AND ($3::text IS NULL OR status = $3)
              AND (NOT $4 OR is_current)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(filter.rfq_id.map(|r| *r.as_uuid()))
        .bind(filter.supplier_id.as_ref().map(|s| s.as_str().to_string()))
        .bind(filter.status.map(|s| s.to_string()))
        .bind(filter.current_only)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Quotation", "list"))?;
        Ok(rows.into_iter().map(|Json(q)| q).collect())
    }

    async fn find_chain(
        &self,
        rfq_id: &RfqId,
        supplier_id: &SupplierId,
    ) -> RepositoryResult<Vec<Quotation>> {
        let rows: Vec<Json<Quotation>> = sqlx::query_scalar(
            r#"
            SELECT document FROM quotations
            WHERE rfq_id = $1 AND supplier_id = $2
            ORDER BY version_number ASC
            "#,
        )
        .bind(rfq_id.as_uuid())
        .bind(supplier_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Quotation", format!("{rfq_id}/{supplier_id}")))?;
        Ok(rows.into_iter().map(|Json(q)| q).collect())
    }

    async fn insert_revision(
        &self,
        revision: &Quotation,
        superseded: &Quotation,
        expected_superseded_version: u64,
    ) -> RepositoryResult<()> {
        let mut tx = self.pool.begin().await.map_err(begin_error)?;
        update_row(&mut tx, superseded, expected_superseded_version).await?;
        insert_row(&mut tx, revision).await?;
        tx.commit().await.map_err(begin_error)
    }

    async fn delete_revision(
        &self,
        id: &QuotationId,
        expected_version: u64,
        promoted: Option<(&Quotation, u64)>,
    ) -> RepositoryResult<()> {
        let mut tx = self.pool.begin().await.map_err(begin_error)?;
        let result = sqlx::query("DELETE FROM quotations WHERE id = $1 AND version = $2")
            .bind(id.as_uuid())
            .bind(to_db_version(expected_version)?)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error(e, "Quotation", id))?;
        if result.rows_affected() == 0 {
            let actual = current_version(&mut tx, *id).await?;
            return Err(cas_miss("Quotation", id, expected_version, actual));
        }
        if let Some((row, expected)) = promoted {
            update_row(&mut tx, row, expected).await?;
        }
        tx.commit().await.map_err(begin_error)
    }
}
