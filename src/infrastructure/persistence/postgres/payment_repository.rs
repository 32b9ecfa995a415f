//! # PostgreSQL Payment Repository

use super::{cas_miss, map_sqlx_error, to_db_version};
use crate::domain::entities::payment::Payment;
use crate::domain::value_objects::{CompanyId, OrderId, PaymentId};
use crate::infrastructure::persistence::traits::{PaymentRepository, RepositoryResult};
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

/// PostgreSQL implementation of [`PaymentRepository`].
#[derive(Debug, Clone)]
pub struct PostgresPaymentRepository {
    pool: PgPool,
}

impl PostgresPaymentRepository {
    /// Creates a repository over `pool`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(crate) async fn insert_row(conn: &mut PgConnection, payment: &Payment) -> RepositoryResult<()> {
    sqlx::query(
        r#"
        INSERT INTO payments (id, order_id, company_id, status, version, created_at, document)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(payment.id().as_uuid())
    .bind(payment.order_id().as_uuid())
    .bind(payment.company_id().as_str())
    .bind(payment.status().to_string())
    .bind(to_db_version(payment.version())?)
    .bind(payment.created_at().as_datetime())
    .bind(Json(payment))
    .execute(conn)
    .await
    .map_err(|e| map_sqlx_error(e, "Payment for order", payment.order_id()))?;
    Ok(())
}

#[async_trait]
impl PaymentRepository for PostgresPaymentRepository {
    async fn insert(&self, payment: &Payment) -> RepositoryResult<()> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error(e, "Payment", payment.id()))?;
        insert_row(&mut conn, payment).await
    }

    async fn update(&self, payment: &Payment, expected_version: u64) -> RepositoryResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = $3, version = $4, document = $5
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(payment.id().as_uuid())
        .bind(to_db_version(expected_version)?)
        .bind(payment.status().to_string())
        .bind(to_db_version(payment.version())?)
        .bind(Json(payment))
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Payment", payment.id()))?;

        if result.rows_affected() == 0 {
            let actual: Option<i64> =
                sqlx::query_scalar("SELECT version FROM payments WHERE id = $1")
                    .bind(payment.id().as_uuid())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(|e| map_sqlx_error(e, "Payment", payment.id()))?;
            return Err(cas_miss("Payment", payment.id(), expected_version, actual));
        }
        Ok(())
    }

    async fn get(&self, id: &PaymentId) -> RepositoryResult<Option<Payment>> {
        let row: Option<Json<Payment>> =
            sqlx::query_scalar("SELECT document FROM payments WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_sqlx_error(e, "Payment", id))?;
        Ok(row.map(|Json(p)| p))
    }

    async fn get_by_order(&self, order_id: &OrderId) -> RepositoryResult<Option<Payment>> {
        let row: Option<Json<Payment>> =
            sqlx::query_scalar("SELECT document FROM payments WHERE order_id = $1")
                .bind(order_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_sqlx_error(e, "Payment", order_id))?;
        Ok(row.map(|Json(p)| p))
    }

    async fn find_by_company(&self, company_id: &CompanyId) -> RepositoryResult<Vec<Payment>> {
        let rows: Vec<Json<Payment>> = sqlx::query_scalar(
            "SELECT document FROM payments WHERE company_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(company_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Payment", company_id))?;
        Ok(rows.into_iter().map(|Json(p)| p).collect())
    }
}
