//! # In-Memory Payment Repository
//!
//! In-memory implementation of [`PaymentRepository`].

use crate::domain::entities::payment::Payment;
use crate::domain::value_objects::{CompanyId, OrderId, PaymentId};
use crate::infrastructure::persistence::traits::{
    PaymentRepository, RepositoryError, RepositoryResult,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub(crate) type PaymentMap = HashMap<PaymentId, Payment>;

/// In-memory implementation of [`PaymentRepository`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentRepository {
    storage: Arc<RwLock<PaymentMap>>,
}

impl InMemoryPaymentRepository {
    /// Creates a new empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn shared(&self) -> Arc<RwLock<PaymentMap>> {
        Arc::clone(&self.storage)
    }
}

pub(crate) fn check_new_payment(storage: &PaymentMap, payment: &Payment) -> RepositoryResult<()> {
    if storage.contains_key(&payment.id()) {
        return Err(RepositoryError::duplicate("Payment", payment.id()));
    }
    if storage.values().any(|p| p.order_id() == payment.order_id()) {
        return Err(RepositoryError::duplicate("Payment for order", payment.order_id()));
    }
    Ok(())
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
    async fn insert(&self, payment: &Payment) -> RepositoryResult<()> {
        let mut storage = self.storage.write().await;
        check_new_payment(&storage, payment)?;
        storage.insert(payment.id(), payment.clone());
        Ok(())
    }

    async fn update(&self, payment: &Payment, expected_version: u64) -> RepositoryResult<()> {
        let mut storage = self.storage.write().await;
        let stored = storage
            .get_mut(&payment.id())
            .ok_or_else(|| RepositoryError::not_found("Payment", payment.id()))?;
        if stored.version() != expected_version {
            return Err(RepositoryError::version_conflict(
                "Payment",
                payment.id(),
                expected_version,
                stored.version(),
            ));
        }
        *stored = payment.clone();
        Ok(())
    }

    async fn get(&self, id: &PaymentId) -> RepositoryResult<Option<Payment>> {
        Ok(self.storage.read().await.get(id).cloned())
    }

    async fn get_by_order(&self, order_id: &OrderId) -> RepositoryResult<Option<Payment>> {
        let storage = self.storage.read().await;
        Ok(storage
            .values()
            .find(|p| p.order_id() == *order_id)
            .cloned())
    }

    async fn find_by_company(&self, company_id: &CompanyId) -> RepositoryResult<Vec<Payment>> {
        let storage = self.storage.read().await;
        let mut payments: Vec<Payment> = storage
            .values()
            .filter(|p| p.company_id() == company_id)
            .cloned()
            .collect();
        payments.sort_by_key(|p| (p.created_at(), p.id()));
        Ok(payments)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Price;

    fn payment(order: OrderId) -> Payment {
        Payment::new(order, CompanyId::new("acme"), "90".parse::<Price>().unwrap(), "usd").unwrap()
    }

    #[tokio::test]
    async fn one_payment_per_order() {
        let repo = InMemoryPaymentRepository::new();
        let order = OrderId::new_v4();
        repo.insert(&payment(order)).await.unwrap();
        let err = repo.insert(&payment(order)).await.unwrap_err();
        assert!(err.is_duplicate());
        assert!(repo.get_by_order(&order).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_checks_version() {
        let repo = InMemoryPaymentRepository::new();
        let mut p = payment(OrderId::new_v4());
        repo.insert(&p).await.unwrap();
        let expected = p.version();
        p.confirm("txn-9").unwrap();
        repo.update(&p, expected).await.unwrap();
        assert!(repo.update(&p, expected).await.unwrap_err().is_version_conflict());
    }

    #[tokio::test]
    async fn find_by_company() {
        let repo = InMemoryPaymentRepository::new();
        repo.insert(&payment(OrderId::new_v4())).await.unwrap();
        repo.insert(&payment(OrderId::new_v4())).await.unwrap();
        let found = repo.find_by_company(&CompanyId::new("acme")).await.unwrap();
        assert_eq!(found.len(), 2);
        assert!(repo.find_by_company(&CompanyId::new("x")).await.unwrap().is_empty());
    }
}
