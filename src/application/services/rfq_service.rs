//! # RFQ Lifecycle Service
//!
//! Use cases over RFQ documents: details, items, invitations and the
//! `DRAFT → PUBLISHED → CLOSED` lifecycle with cancellation.
//!
//! Each mutation loads the RFQ, applies one domain method and writes it
//! back with a compare-and-swap on the loaded version. Events are
//! published after the write commits.

use crate::application::dto::{NewRfq, RfqDetails};
use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::events::EventPublisher;
use crate::domain::entities::rfq::{Rfq, RfqItemSpec};
use crate::domain::errors::DomainResult;
use crate::domain::events::{RfqChange, RfqEvent};
use crate::domain::value_objects::{InvitationId, RfqId, RfqItemId, RfqStatus, SupplierId};
use crate::infrastructure::persistence::{RfqDeletionUnit, RfqFilter, RfqRepository};
use crate::infrastructure::reference_data::ReferenceDataGateway;
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{info, instrument};

/// RFQ lifecycle manager.
#[derive(Debug, Clone)]
pub struct RfqService {
    rfqs: Arc<dyn RfqRepository>,
    deletion: Arc<dyn RfqDeletionUnit>,
    reference: Arc<dyn ReferenceDataGateway>,
    events: EventPublisher,
}

impl RfqService {
    /// Creates the service over its ports.
    #[must_use]
    pub fn new(
        rfqs: Arc<dyn RfqRepository>,
        deletion: Arc<dyn RfqDeletionUnit>,
        reference: Arc<dyn ReferenceDataGateway>,
        events: EventPublisher,
    ) -> Self {
        Self {
            rfqs,
            deletion,
            reference,
            events,
        }
    }

    async fn load(&self, id: RfqId) -> ApplicationResult<Rfq> {
        self.rfqs
            .get(&id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("RFQ", id))
    }

    async fn mutate<T, F>(&self, id: RfqId, change: F) -> ApplicationResult<(Rfq, T)>
    where
        F: FnOnce(&mut Rfq) -> DomainResult<T> + Send,
        T: Send,
    {
        let mut rfq = self.load(id).await?;
        let expected = rfq.version();
        let out = change(&mut rfq)?;
        self.rfqs.update(&rfq, expected).await?;
        Ok((rfq, out))
    }

    async fn ensure_category(&self, spec: &RfqItemSpec) -> ApplicationResult<()> {
        if self.reference.get_category(&spec.category_id).await?.is_none() {
            return Err(ApplicationError::not_found("Category", &spec.category_id));
        }
        Ok(())
    }

    async fn ensure_supplier(&self, supplier: &SupplierId) -> ApplicationResult<()> {
        if self.reference.get_supplier(supplier).await?.is_none() {
            return Err(ApplicationError::not_found("Supplier", supplier));
        }
        Ok(())
    }

    /// Creates a draft RFQ for an existing company.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the company is unknown
    /// - `Validation` for a blank title or past deadline
    #[instrument(skip(self, request), fields(company_id = %request.company_id))]
    pub async fn create(&self, request: NewRfq) -> ApplicationResult<Rfq> {
        if self.reference.get_company(&request.company_id).await?.is_none() {
            return Err(ApplicationError::not_found("Company", &request.company_id));
        }
        let rfq = Rfq::new(
            request.company_id,
            request.title,
            request.description,
            request.rfq_type,
            request.deadline,
        )?;
        self.rfqs.insert(&rfq).await?;
        info!(rfq_id = %rfq.id(), rfq_type = %rfq.rfq_type(), "RFQ created");
        self.events
            .publish(RfqEvent::new(
                rfq.id(),
                RfqChange::Created {
                    company_id: rfq.company_id().clone(),
                    rfq_type: rfq.rfq_type(),
                    title: rfq.title().to_string(),
                },
            ))
            .await;
        Ok(rfq)
    }

    /// Replaces title, description and deadline of a draft.
    ///
    /// # Errors
    ///
    /// `NotFound`, `InvalidState` unless draft, `Validation`, `Conflict` on
    /// a concurrent write.
    #[instrument(skip(self, details), fields(rfq_id = %id))]
    pub async fn update_details(&self, id: RfqId, details: RfqDetails) -> ApplicationResult<Rfq> {
        let (rfq, ()) = self
            .mutate(id, |rfq| {
                rfq.update_details(details.title, details.description, details.deadline)
            })
            .await?;
        self.events.publish(RfqEvent::new(id, RfqChange::DetailsUpdated)).await;
        Ok(rfq)
    }

    /// Adds a line item to a draft.
    ///
    /// # Errors
    ///
    /// `NotFound` for the RFQ or category, `InvalidState` unless draft,
    /// `Validation` for a malformed item.
    #[instrument(skip(self, spec), fields(rfq_id = %id, category_id = %spec.category_id))]
    pub async fn add_item(&self, id: RfqId, spec: RfqItemSpec) -> ApplicationResult<RfqItemId> {
        self.ensure_category(&spec).await?;
        let (_, item_id) = self.mutate(id, |rfq| rfq.add_item(spec)).await?;
        info!(%item_id, "RFQ item added");
        self.events
            .publish(RfqEvent::new(id, RfqChange::ItemAdded { item_id }))
            .await;
        Ok(item_id)
    }

    /// Replaces a line item of a draft.
    ///
    /// # Errors
    ///
    /// As [`add_item`](Self::add_item), plus `NotFound` for an unknown item.
    #[instrument(skip(self, spec), fields(rfq_id = %id, %item_id))]
    pub async fn update_item(
        &self,
        id: RfqId,
        item_id: RfqItemId,
        spec: RfqItemSpec,
    ) -> ApplicationResult<Rfq> {
        self.ensure_category(&spec).await?;
        let (rfq, ()) = self.mutate(id, |rfq| rfq.update_item(item_id, spec)).await?;
        self.events
            .publish(RfqEvent::new(id, RfqChange::ItemUpdated { item_id }))
            .await;
        Ok(rfq)
    }

    /// Removes a line item from a draft.
    ///
    /// # Errors
    ///
    /// `NotFound` for the RFQ or item, `InvalidState` unless draft.
    #[instrument(skip(self), fields(rfq_id = %id, %item_id))]
    pub async fn delete_item(&self, id: RfqId, item_id: RfqItemId) -> ApplicationResult<Rfq> {
        let (rfq, ()) = self.mutate(id, |rfq| rfq.remove_item(item_id)).await?;
        self.events
            .publish(RfqEvent::new(id, RfqChange::ItemRemoved { item_id }))
            .await;
        Ok(rfq)
    }

    /// Publishes a draft with at least one item.
    ///
    /// # Errors
    ///
    /// `NotFound`, or `InvalidState` unless draft with items.
    #[instrument(skip(self), fields(rfq_id = %id))]
    pub async fn publish(&self, id: RfqId) -> ApplicationResult<Rfq> {
        let (rfq, ()) = self.mutate(id, Rfq::publish).await?;
        info!(items = rfq.items().len(), "RFQ published");
        self.events
            .publish(RfqEvent::new(
                id,
                RfqChange::Published {
                    item_count: rfq.items().len(),
                },
            ))
            .await;
        Ok(rfq)
    }

    /// Invites one supplier to an invitation-only RFQ.
    ///
    /// # Errors
    ///
    /// `NotFound` for the RFQ or supplier, `InvalidOperation` for open
    /// RFQs, `InvalidState` once closed or cancelled, `Conflict` if the
    /// supplier is already invited.
    #[instrument(skip(self), fields(rfq_id = %id, supplier_id = %supplier))]
    pub async fn invite(&self, id: RfqId, supplier: SupplierId) -> ApplicationResult<InvitationId> {
        let ids = self.invite_bulk(id, vec![supplier]).await?;
        ids.into_iter()
            .next()
            .ok_or_else(|| ApplicationError::invalid_state("invitation was not recorded"))
    }

    /// Invites several suppliers, all or nothing.
    ///
    /// Every supplier is checked against the catalog before anything is
    /// written.
    ///
    /// # Errors
    ///
    /// As [`invite`](Self::invite); a supplier listed twice is a `Conflict`.
    #[instrument(skip(self, suppliers), fields(rfq_id = %id, count = suppliers.len()))]
    pub async fn invite_bulk(
        &self,
        id: RfqId,
        suppliers: Vec<SupplierId>,
    ) -> ApplicationResult<Vec<InvitationId>> {
        try_join_all(suppliers.iter().map(|supplier| self.ensure_supplier(supplier))).await?;
        let supplier_ids = suppliers.clone();
        let (_, ids) = self.mutate(id, |rfq| rfq.invite_all(suppliers)).await?;
        info!(invited = ids.len(), "suppliers invited");
        self.events
            .publish(RfqEvent::new(id, RfqChange::SuppliersInvited { supplier_ids }))
            .await;
        Ok(ids)
    }

    /// Revokes a supplier's active invitation.
    ///
    /// # Errors
    ///
    /// `NotFound` for the RFQ or if no active invitation exists.
    #[instrument(skip(self), fields(rfq_id = %id, supplier_id = %supplier))]
    pub async fn revoke_invitation(&self, id: RfqId, supplier: SupplierId) -> ApplicationResult<Rfq> {
        let (rfq, ()) = self.mutate(id, |rfq| rfq.revoke_invitation(&supplier)).await?;
        self.events
            .publish(RfqEvent::new(
                id,
                RfqChange::InvitationRevoked {
                    supplier_id: supplier,
                },
            ))
            .await;
        Ok(rfq)
    }

    /// Closes a published RFQ. Its quotations are left as they are.
    ///
    /// # Errors
    ///
    /// `NotFound`, or `InvalidState` unless published.
    #[instrument(skip(self), fields(rfq_id = %id))]
    pub async fn close(&self, id: RfqId) -> ApplicationResult<Rfq> {
        let (rfq, ()) = self.mutate(id, Rfq::close).await?;
        info!("RFQ closed");
        self.events.publish(RfqEvent::new(id, RfqChange::Closed)).await;
        Ok(rfq)
    }

    /// Cancels a draft or published RFQ.
    ///
    /// # Errors
    ///
    /// `NotFound`, or `InvalidState` once closed or cancelled.
    #[instrument(skip(self), fields(rfq_id = %id))]
    pub async fn cancel(&self, id: RfqId) -> ApplicationResult<Rfq> {
        let (rfq, ()) = self.mutate(id, Rfq::cancel).await?;
        info!("RFQ cancelled");
        self.events.publish(RfqEvent::new(id, RfqChange::Cancelled)).await;
        Ok(rfq)
    }

    /// Hard-deletes an RFQ nobody has quoted on.
    ///
    /// The quotation check and the delete are one store operation.
    ///
    /// # Errors
    ///
    /// `NotFound`, or `Conflict` if any quotation references the RFQ or
    /// the RFQ changed since it was loaded.
    #[instrument(skip(self), fields(rfq_id = %id))]
    pub async fn delete(&self, id: RfqId) -> ApplicationResult<()> {
        let rfq = self.load(id).await?;
        self.deletion.delete_unquoted(&id, rfq.version()).await?;
        info!("RFQ deleted");
        self.events.publish(RfqEvent::new(id, RfqChange::Deleted)).await;
        Ok(())
    }

    /// Gets an RFQ.
    ///
    /// # Errors
    ///
    /// `NotFound` if unknown.
    #[instrument(skip(self), fields(rfq_id = %id))]
    pub async fn get(&self, id: RfqId) -> ApplicationResult<Rfq> {
        self.load(id).await
    }

    /// Lists RFQs by company and status, oldest first.
    ///
    /// # Errors
    ///
    /// `Infrastructure` on storage failure.
    #[instrument(skip(self))]
    pub async fn list(&self, filter: RfqFilter) -> ApplicationResult<Vec<Rfq>> {
        Ok(self.rfqs.list(&filter).await?)
    }

    /// Lists published RFQs the supplier may quote on.
    ///
    /// # Errors
    ///
    /// `Infrastructure` on storage failure.
    #[instrument(skip(self), fields(supplier_id = %supplier))]
    pub async fn list_visible_to(&self, supplier: &SupplierId) -> ApplicationResult<Vec<Rfq>> {
        let filter = RfqFilter {
            company_id: None,
            status: Some(RfqStatus::Published),
        };
        let rfqs = self.rfqs.list(&filter).await?;
        Ok(rfqs.into_iter().filter(|r| r.is_visible_to(supplier)).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::application::error::ErrorKind;
    use crate::domain::entities::reference::{Category, Company, Supplier};
    use crate::domain::value_objects::{Quantity, RfqType};
    use crate::infrastructure::persistence::EventStore;
    use crate::infrastructure::persistence::in_memory::{
        InMemoryEventStore, InMemoryQuotationRepository, InMemoryRfqDeletionUnit,
        InMemoryRfqRepository,
    };
    use crate::infrastructure::reference_data::InMemoryReferenceData;

    fn service() -> (RfqService, Arc<InMemoryEventStore>) {
        let events = Arc::new(InMemoryEventStore::new());
        let reference = InMemoryReferenceData::new()
            .with_company(Company::new("acme", "Acme"))
            .with_supplier(Supplier::new("s-1", "Globex"))
            .with_category(Category::new("office", "Office"));
        let rfqs = InMemoryRfqRepository::new();
        let quotations = InMemoryQuotationRepository::referencing(&rfqs);
        let service = RfqService::new(
            Arc::new(rfqs.clone()),
            Arc::new(InMemoryRfqDeletionUnit::new(&rfqs, &quotations)),
            Arc::new(reference),
            EventPublisher::new(events.clone()),
        );
        (service, events)
    }

    async fn invited_draft(svc: &RfqService) -> Rfq {
        svc.create(NewRfq::new("acme", "Pens").rfq_type(RfqType::Invited))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn writes_bump_version_and_emit_events() {
        let (svc, events) = service();
        let rfq = invited_draft(&svc).await;
        svc.add_item(
            rfq.id(),
            RfqItemSpec::new("office", Quantity::from_units(3).unwrap(), "box"),
        )
        .await
        .unwrap();
        let published = svc.publish(rfq.id()).await.unwrap();

        assert_eq!(published.version(), rfq.version() + 2);
        assert_eq!(events.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn duplicate_invitation_conflicts() {
        let (svc, _) = service();
        let rfq = invited_draft(&svc).await;
        svc.invite(rfq.id(), SupplierId::new("s-1")).await.unwrap();
        let err = svc.invite(rfq.id(), SupplierId::new("s-1")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err = svc
            .invite_bulk(rfq.id(), vec![SupplierId::new("s-1"), SupplierId::new("s-1")])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn revoking_without_invitation_is_not_found() {
        let (svc, _) = service();
        let rfq = invited_draft(&svc).await;
        let err = svc
            .revoke_invitation(rfq.id(), SupplierId::new("s-1"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn unknown_rfq() {
        let (svc, _) = service();
        assert!(svc.close(RfqId::new_v4()).await.unwrap_err().is_not_found());
    }
}
