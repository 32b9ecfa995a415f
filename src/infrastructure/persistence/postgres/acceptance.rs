//! # PostgreSQL Acceptance Unit of Work

use super::map_sqlx_error;
use super::{payment_repository, quotation_repository};
use crate::domain::entities::payment::Payment;
use crate::domain::entities::quotation::Quotation;
use crate::infrastructure::persistence::traits::{AcceptanceUnitOfWork, RepositoryResult};
use async_trait::async_trait;
use sqlx::PgPool;

/// Writes the accepted quotation and inserts its payment in one
/// transaction.
///
/// A second accepted row in the chain or a second payment for the order
/// trips a unique index and rolls the transaction back.
#[derive(Debug, Clone)]
pub struct PostgresAcceptanceUnit {
    pool: PgPool,
}

impl PostgresAcceptanceUnit {
    /// Creates a unit over `pool`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AcceptanceUnitOfWork for PostgresAcceptanceUnit {
    async fn commit_acceptance(
        &self,
        quotation: &Quotation,
        expected_version: u64,
        payment: &Payment,
    ) -> RepositoryResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error(e, "Quotation", quotation.id()))?;
        quotation_repository::update_row(&mut tx, quotation, expected_version).await?;
        payment_repository::insert_row(&mut tx, payment).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error(e, "Quotation", quotation.id()))
    }
}
