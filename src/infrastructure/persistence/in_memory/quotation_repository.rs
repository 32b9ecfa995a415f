//! # In-Memory Quotation Repository
//!
//! In-memory implementation of [`QuotationRepository`].
//!
//! Multi-row operations hold the write lock for their whole duration, so
//! readers never observe a chain with zero or two current rows.
//!
//! A repository built with [`referencing`](InMemoryQuotationRepository::referencing)
//! refuses first rows for RFQs that are gone. Locks are taken RFQs first,
//! then quotations.

use super::rfq_repository::{InMemoryRfqRepository, RfqMap};
use crate::domain::entities::quotation::Quotation;
use crate::domain::value_objects::{QuotationId, RfqId, SupplierId};
use crate::infrastructure::persistence::traits::{
    QuotationFilter, QuotationRepository, RepositoryError, RepositoryResult,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub(crate) type QuotationMap = HashMap<QuotationId, Quotation>;

/// In-memory implementation of [`QuotationRepository`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryQuotationRepository {
    storage: Arc<RwLock<QuotationMap>>,
    rfqs: Option<Arc<RwLock<RfqMap>>>,
}

impl InMemoryQuotationRepository {
    /// Creates a new empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty repository whose first rows must reference an RFQ
    /// stored in `rfqs`.
    #[must_use]
    pub fn referencing(rfqs: &InMemoryRfqRepository) -> Self {
        Self {
            storage: Arc::default(),
            rfqs: Some(rfqs.shared()),
        }
    }

    pub(crate) fn shared(&self) -> Arc<RwLock<QuotationMap>> {
        Arc::clone(&self.storage)
    }
}

pub(crate) fn check_version(
    storage: &QuotationMap,
    id: QuotationId,
    expected_version: u64,
) -> RepositoryResult<()> {
    let stored = storage
        .get(&id)
        .ok_or_else(|| RepositoryError::not_found("Quotation", id))?;
    if stored.version() != expected_version {
        return Err(RepositoryError::version_conflict(
            "Quotation",
            id,
            expected_version,
            stored.version(),
        ));
    }
    Ok(())
}

fn has_other_current(storage: &QuotationMap, quotation: &Quotation) -> bool {
    storage.values().any(|q| {
        q.id() != quotation.id()
            && q.is_current()
            && q.rfq_id() == quotation.rfq_id()
            && q.supplier_id() == quotation.supplier_id()
    })
}

#[async_trait]
impl QuotationRepository for InMemoryQuotationRepository {
    async fn insert(&self, quotation: &Quotation) -> RepositoryResult<()> {
        let rfqs = match &self.rfqs {
            Some(rfqs) => Some(rfqs.read().await),
            None => None,
        };
        if rfqs.as_ref().is_some_and(|r| !r.contains_key(&quotation.rfq_id())) {
            return Err(RepositoryError::not_found("RFQ", quotation.rfq_id()));
        }
        let mut storage = self.storage.write().await;
        if storage.contains_key(&quotation.id()) {
            return Err(RepositoryError::duplicate("Quotation", quotation.id()));
        }
        if quotation.is_current() && has_other_current(&storage, quotation) {
            return Err(RepositoryError::duplicate(
                "Quotation chain",
                format!("{}/{}", quotation.rfq_id(), quotation.supplier_id()),
            ));
        }
        storage.insert(quotation.id(), quotation.clone());
        Ok(())
    }

    async fn update(&self, quotation: &Quotation, expected_version: u64) -> RepositoryResult<()> {
        let mut storage = self.storage.write().await;
        check_version(&storage, quotation.id(), expected_version)?;
        storage.insert(quotation.id(), quotation.clone());
        Ok(())
    }

    async fn get(&self, id: &QuotationId) -> RepositoryResult<Option<Quotation>> {
        Ok(self.storage.read().await.get(id).cloned())
    }

    async fn list(&self, filter: &QuotationFilter) -> RepositoryResult<Vec<Quotation>> {
        let storage = self.storage.read().await;
        let mut rows: Vec<Quotation> = storage
            .values()
            .filter(|q| filter.matches(q))
            .cloned()
            .collect();
        rows.sort_by_key(|q| (q.created_at(), q.id()));
        Ok(rows)
    }

    async fn find_chain(
        &self,
        rfq_id: &RfqId,
        supplier_id: &SupplierId,
    ) -> RepositoryResult<Vec<Quotation>> {
        let storage = self.storage.read().await;
        let mut chain: Vec<Quotation> = storage
            .values()
            .filter(|q| q.rfq_id() == *rfq_id && q.supplier_id() == supplier_id)
            .cloned()
            .collect();
        chain.sort_by_key(Quotation::version_number);
        Ok(chain)
    }

    async fn insert_revision(
        &self,
        revision: &Quotation,
        superseded: &Quotation,
        expected_superseded_version: u64,
    ) -> RepositoryResult<()> {
        let mut storage = self.storage.write().await;
        check_version(&storage, superseded.id(), expected_superseded_version)?;
        if storage.contains_key(&revision.id()) {
            return Err(RepositoryError::duplicate("Quotation", revision.id()));
        }
        storage.insert(superseded.id(), superseded.clone());
        storage.insert(revision.id(), revision.clone());
        Ok(())
    }

    async fn delete_revision(
        &self,
        id: &QuotationId,
        expected_version: u64,
        promoted: Option<(&Quotation, u64)>,
    ) -> RepositoryResult<()> {
        let mut storage = self.storage.write().await;
        check_version(&storage, *id, expected_version)?;
        if let Some((row, expected)) = promoted {
            check_version(&storage, row.id(), expected)?;
        }
        storage.remove(id);
        if let Some((row, _)) = promoted {
            storage.insert(row.id(), row.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::entities::rfq::{Rfq, RfqItemSpec};
    use crate::domain::value_objects::{CompanyId, Quantity};
    use crate::infrastructure::persistence::traits::RfqRepository;

    fn rfq() -> Rfq {
        let mut rfq = Rfq::builder(CompanyId::new("acme"), "Desks").build().unwrap();
        rfq.add_item(RfqItemSpec::new("desk", Quantity::from_units(2).unwrap(), "pc"))
            .unwrap();
        rfq.publish().unwrap();
        rfq
    }

    #[tokio::test]
    async fn second_chain_for_same_supplier_is_duplicate() {
        let repo = InMemoryQuotationRepository::new();
        let rfq = rfq();
        let first = Quotation::start(&rfq, SupplierId::new("s1"), "").unwrap();
        repo.insert(&first).await.unwrap();
        let second = Quotation::start(&rfq, SupplierId::new("s1"), "").unwrap();
        assert!(repo.insert(&second).await.unwrap_err().is_duplicate());
        let other = Quotation::start(&rfq, SupplierId::new("s2"), "").unwrap();
        repo.insert(&other).await.unwrap();
        let filter = QuotationFilter {
            rfq_id: Some(rfq.id()),
            ..QuotationFilter::default()
        };
        assert_eq!(repo.list(&filter).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn first_row_needs_a_stored_rfq() {
        let rfqs = InMemoryRfqRepository::new();
        let repo = InMemoryQuotationRepository::referencing(&rfqs);
        let rfq = rfq();
        let quotation = Quotation::start(&rfq, SupplierId::new("s1"), "").unwrap();
        assert!(repo.insert(&quotation).await.unwrap_err().is_not_found());

        rfqs.insert(&rfq).await.unwrap();
        repo.insert(&quotation).await.unwrap();
    }

    #[tokio::test]
    async fn revision_swaps_current_flag() {
        let repo = InMemoryQuotationRepository::new();
        let rfq = rfq();
        let mut first = Quotation::start(&rfq, SupplierId::new("s1"), "").unwrap();
        repo.insert(&first).await.unwrap();

        let expected = first.version();
        let revision = first.revision(2, first.id());
        first.mark_superseded();
        repo.insert_revision(&revision, &first, expected).await.unwrap();

        let chain = repo.find_chain(&rfq.id(), &SupplierId::new("s1")).await.unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.iter().filter(|q| q.is_current()).count(), 1);
        assert_eq!(chain[1].id(), revision.id());
    }

    #[tokio::test]
    async fn stale_revision_writes_nothing() {
        let repo = InMemoryQuotationRepository::new();
        let rfq = rfq();
        let mut first = Quotation::start(&rfq, SupplierId::new("s1"), "").unwrap();
        repo.insert(&first).await.unwrap();

        let revision = first.revision(2, first.id());
        first.mark_superseded();
        let err = repo.insert_revision(&revision, &first, 42).await.unwrap_err();
        assert!(err.is_version_conflict());
        assert!(repo.get(&revision.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_revision_promotes() {
        let repo = InMemoryQuotationRepository::new();
        let rfq = rfq();
        let mut first = Quotation::start(&rfq, SupplierId::new("s1"), "").unwrap();
        repo.insert(&first).await.unwrap();
        let v1 = first.version();
        let revision = first.revision(2, first.id());
        first.mark_superseded();
        repo.insert_revision(&revision, &first, v1).await.unwrap();

        let expected_first = first.version();
        first.mark_current();
        repo.delete_revision(&revision.id(), revision.version(), Some((&first, expected_first)))
            .await
            .unwrap();

        let chain = repo.find_chain(&rfq.id(), &SupplierId::new("s1")).await.unwrap();
        assert_eq!(chain.len(), 1);
        assert!(chain[0].is_current());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        async fn build_chain(revisions: u32) -> (InMemoryQuotationRepository, Rfq) {
            let repo = InMemoryQuotationRepository::new();
            let rfq = rfq();
            let mut current = Quotation::start(&rfq, SupplierId::new("s1"), "").unwrap();
            repo.insert(&current).await.unwrap();
            for number in 2..=revisions + 1 {
                let expected = current.version();
                let next = current.revision(number, current.id());
                current.mark_superseded();
                repo.insert_revision(&next, &current, expected).await.unwrap();
                current = next;
            }
            (repo, rfq)
        }

        proptest! {
            #[test]
            fn chain_keeps_one_current_row(revisions in 0u32..12) {
                let runtime = tokio::runtime::Runtime::new().unwrap();
                let (repo, rfq) = runtime.block_on(build_chain(revisions));
                let chain = runtime
                    .block_on(repo.find_chain(&rfq.id(), &SupplierId::new("s1")))
                    .unwrap();

                prop_assert_eq!(chain.len() as u32, revisions + 1);
                prop_assert_eq!(chain.iter().filter(|q| q.is_current()).count(), 1);
                prop_assert!(chain.last().unwrap().is_current());
                for pair in chain.windows(2) {
                    prop_assert_eq!(pair[1].version_number(), pair[0].version_number() + 1);
                    prop_assert_eq!(pair[1].previous_version_id(), Some(pair[0].id()));
                }
            }
        }
    }
}
