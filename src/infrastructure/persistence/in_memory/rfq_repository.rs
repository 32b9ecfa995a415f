//! # In-Memory RFQ Repository
//!
//! In-memory implementation of [`RfqRepository`] for tests and the demo.

use crate::domain::entities::rfq::Rfq;
use crate::domain::value_objects::RfqId;
use crate::infrastructure::persistence::traits::{
    RepositoryError, RepositoryResult, RfqFilter, RfqRepository,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub(crate) type RfqMap = HashMap<RfqId, Rfq>;

/// In-memory implementation of [`RfqRepository`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryRfqRepository {
    storage: Arc<RwLock<RfqMap>>,
}

impl InMemoryRfqRepository {
    /// Creates a new empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored RFQs.
    pub async fn len(&self) -> usize {
        self.storage.read().await.len()
    }

    /// Returns true if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub(crate) fn shared(&self) -> Arc<RwLock<RfqMap>> {
        Arc::clone(&self.storage)
    }
}

#[async_trait]
impl RfqRepository for InMemoryRfqRepository {
    async fn insert(&self, rfq: &Rfq) -> RepositoryResult<()> {
        let mut storage = self.storage.write().await;
        if storage.contains_key(&rfq.id()) {
            return Err(RepositoryError::duplicate("RFQ", rfq.id()));
        }
        storage.insert(rfq.id(), rfq.clone());
        Ok(())
    }

    async fn update(&self, rfq: &Rfq, expected_version: u64) -> RepositoryResult<()> {
        let mut storage = self.storage.write().await;
        let stored = storage
            .get_mut(&rfq.id())
            .ok_or_else(|| RepositoryError::not_found("RFQ", rfq.id()))?;
        if stored.version() != expected_version {
            return Err(RepositoryError::version_conflict(
                "RFQ",
                rfq.id(),
                expected_version,
                stored.version(),
            ));
        }
        *stored = rfq.clone();
        Ok(())
    }

    async fn get(&self, id: &RfqId) -> RepositoryResult<Option<Rfq>> {
        Ok(self.storage.read().await.get(id).cloned())
    }

    async fn list(&self, filter: &RfqFilter) -> RepositoryResult<Vec<Rfq>> {
        let storage = self.storage.read().await;
        let mut rfqs: Vec<Rfq> = storage
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        rfqs.sort_by_key(|r| (r.created_at(), r.id()));
        Ok(rfqs)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::entities::rfq::RfqItemSpec;
    use crate::domain::value_objects::{CompanyId, Quantity, RfqStatus};

    fn rfq(company: &str) -> Rfq {
        Rfq::builder(CompanyId::new(company), "Chairs").build().unwrap()
    }

    #[tokio::test]
    async fn insert_and_get() {
        let repo = InMemoryRfqRepository::new();
        let r = rfq("acme");
        repo.insert(&r).await.unwrap();
        assert_eq!(repo.get(&r.id()).await.unwrap(), Some(r.clone()));
        assert!(repo.insert(&r).await.unwrap_err().is_duplicate());
    }

    #[tokio::test]
    async fn update_is_compare_and_swap() {
        let repo = InMemoryRfqRepository::new();
        let mut r = rfq("acme");
        repo.insert(&r).await.unwrap();

        let expected = r.version();
        let mut stale = r.clone();
        r.add_item(RfqItemSpec::new("c", Quantity::from_units(1).unwrap(), "pc"))
            .unwrap();
        repo.update(&r, expected).await.unwrap();

        stale.update_details("other", "", None).unwrap();
        let err = repo.update(&stale, expected).await.unwrap_err();
        assert!(err.is_version_conflict());
    }

    #[tokio::test]
    async fn list_filters_by_company_and_status() {
        let repo = InMemoryRfqRepository::new();
        repo.insert(&rfq("acme")).await.unwrap();
        repo.insert(&rfq("globex")).await.unwrap();

        let filter = RfqFilter {
            company_id: Some(CompanyId::new("acme")),
            status: Some(RfqStatus::Draft),
        };
        assert_eq!(repo.list(&filter).await.unwrap().len(), 1);
        assert_eq!(repo.list(&RfqFilter::default()).await.unwrap().len(), 2);
    }
}
