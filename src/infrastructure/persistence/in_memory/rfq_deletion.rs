//! # In-Memory RFQ Deletion Unit
//!
//! Deletes an RFQ under the RFQ write lock while holding the quotation
//! lock. Locks are taken RFQs first, then quotations, the same order a
//! referencing [`InMemoryQuotationRepository`] uses on insert.

use super::quotation_repository::{InMemoryQuotationRepository, QuotationMap};
use super::rfq_repository::{InMemoryRfqRepository, RfqMap};
use crate::domain::value_objects::RfqId;
use crate::infrastructure::persistence::traits::{
    RepositoryError, RepositoryResult, RfqDeletionUnit,
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// [`RfqDeletionUnit`] over the in-memory RFQ and quotation stores.
#[derive(Debug, Clone)]
pub struct InMemoryRfqDeletionUnit {
    rfqs: Arc<RwLock<RfqMap>>,
    quotations: Arc<RwLock<QuotationMap>>,
}

impl InMemoryRfqDeletionUnit {
    /// Creates a unit sharing storage with the given repositories.
    #[must_use]
    pub fn new(rfqs: &InMemoryRfqRepository, quotations: &InMemoryQuotationRepository) -> Self {
        Self {
            rfqs: rfqs.shared(),
            quotations: quotations.shared(),
        }
    }
}

#[async_trait]
impl RfqDeletionUnit for InMemoryRfqDeletionUnit {
    async fn delete_unquoted(&self, id: &RfqId, expected_version: u64) -> RepositoryResult<()> {
        let mut rfqs = self.rfqs.write().await;
        let quotations = self.quotations.read().await;

        let stored = rfqs
            .get(id)
            .ok_or_else(|| RepositoryError::not_found("RFQ", id))?;
        if stored.version() != expected_version {
            return Err(RepositoryError::version_conflict(
                "RFQ",
                id,
                expected_version,
                stored.version(),
            ));
        }
        let references = quotations.values().filter(|q| q.rfq_id() == *id).count() as u64;
        if references > 0 {
            return Err(RepositoryError::referenced("RFQ", id, references));
        }
        rfqs.remove(id);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::entities::quotation::Quotation;
    use crate::domain::entities::rfq::{Rfq, RfqItemSpec};
    use crate::domain::value_objects::{CompanyId, Quantity, SupplierId};
    use crate::infrastructure::persistence::traits::{QuotationRepository, RfqRepository};

    fn published() -> Rfq {
        let mut rfq = Rfq::builder(CompanyId::new("acme"), "Lamps").build().unwrap();
        rfq.add_item(RfqItemSpec::new("lamp", Quantity::from_units(4).unwrap(), "pc"))
            .unwrap();
        rfq.publish().unwrap();
        rfq
    }

    fn stores() -> (
        InMemoryRfqRepository,
        InMemoryQuotationRepository,
        InMemoryRfqDeletionUnit,
    ) {
        let rfqs = InMemoryRfqRepository::new();
        let quotations = InMemoryQuotationRepository::referencing(&rfqs);
        let unit = InMemoryRfqDeletionUnit::new(&rfqs, &quotations);
        (rfqs, quotations, unit)
    }

    #[tokio::test]
    async fn deletes_unquoted_rfq_and_checks_version() {
        let (rfqs, _, unit) = stores();
        let rfq = published();
        rfqs.insert(&rfq).await.unwrap();

        let err = unit.delete_unquoted(&rfq.id(), 99).await.unwrap_err();
        assert!(err.is_version_conflict());
        unit.delete_unquoted(&rfq.id(), rfq.version()).await.unwrap();
        assert!(rfqs.is_empty().await);

        let err = unit.delete_unquoted(&rfq.id(), rfq.version()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn quoted_rfq_is_kept() {
        let (rfqs, quotations, unit) = stores();
        let rfq = published();
        rfqs.insert(&rfq).await.unwrap();
        let quotation = Quotation::start(&rfq, SupplierId::new("s1"), "").unwrap();
        quotations.insert(&quotation).await.unwrap();

        let err = unit.delete_unquoted(&rfq.id(), rfq.version()).await.unwrap_err();
        assert!(err.is_referenced());
        assert!(rfqs.get(&rfq.id()).await.unwrap().is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_insert_and_delete_never_orphan_a_quotation() {
        for _ in 0..50 {
            let (rfqs, quotations, unit) = stores();
            let rfq = published();
            rfqs.insert(&rfq).await.unwrap();
            let quotation = Quotation::start(&rfq, SupplierId::new("s1"), "").unwrap();

            let insert = {
                let quotations = quotations.clone();
                let quotation = quotation.clone();
                tokio::spawn(async move { quotations.insert(&quotation).await })
            };
            let delete = {
                let unit = unit.clone();
                let (id, version) = (rfq.id(), rfq.version());
                tokio::spawn(async move { unit.delete_unquoted(&id, version).await })
            };
            let inserted = insert.await.unwrap().is_ok();
            let deleted = delete.await.unwrap().is_ok();

            assert!(inserted != deleted);
            let rfq_exists = rfqs.get(&rfq.id()).await.unwrap().is_some();
            let quotation_exists = quotations.get(&quotation.id()).await.unwrap().is_some();
            assert_eq!(rfq_exists, quotation_exists);
        }
    }
}
