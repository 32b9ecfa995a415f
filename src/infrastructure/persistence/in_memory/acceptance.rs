//! # In-Memory Acceptance Unit of Work
//!
//! Writes an accepted quotation and its payment under both store locks.
//! Locks are always taken quotations first, then payments.

use super::payment_repository::{InMemoryPaymentRepository, PaymentMap, check_new_payment};
use super::quotation_repository::{InMemoryQuotationRepository, QuotationMap, check_version};
use crate::domain::entities::payment::Payment;
use crate::domain::entities::quotation::Quotation;
use crate::domain::value_objects::QuotationStatus;
use crate::infrastructure::persistence::traits::{
    AcceptanceUnitOfWork, RepositoryError, RepositoryResult,
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// [`AcceptanceUnitOfWork`] over the in-memory quotation and payment stores.
#[derive(Debug, Clone)]
pub struct InMemoryAcceptanceUnit {
    quotations: Arc<RwLock<QuotationMap>>,
    payments: Arc<RwLock<PaymentMap>>,
}

impl InMemoryAcceptanceUnit {
    /// Creates a unit sharing storage with the given repositories.
    #[must_use]
    pub fn new(
        quotations: &InMemoryQuotationRepository,
        payments: &InMemoryPaymentRepository,
    ) -> Self {
        Self {
            quotations: quotations.shared(),
            payments: payments.shared(),
        }
    }
}

#[async_trait]
impl AcceptanceUnitOfWork for InMemoryAcceptanceUnit {
    async fn commit_acceptance(
        &self,
        quotation: &Quotation,
        expected_version: u64,
        payment: &Payment,
    ) -> RepositoryResult<()> {
        let mut quotations = self.quotations.write().await;
        let mut payments = self.payments.write().await;

        check_version(&quotations, quotation.id(), expected_version)?;
        let chain_accepted = quotations.values().any(|q| {
            q.id() != quotation.id()
                && q.rfq_id() == quotation.rfq_id()
                && q.supplier_id() == quotation.supplier_id()
                && q.status() == QuotationStatus::Accepted
        });
        if chain_accepted {
            return Err(RepositoryError::duplicate(
                "Accepted quotation",
                format!("{}/{}", quotation.rfq_id(), quotation.supplier_id()),
            ));
        }
        check_new_payment(&payments, payment)?;

        quotations.insert(quotation.id(), quotation.clone());
        payments.insert(payment.id(), payment.clone());
        Ok(())
    }
}
