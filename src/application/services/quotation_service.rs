//! # Quotation Lifecycle Service
//!
//! Drafting, pricing, submission, review and versioning of supplier
//! quotations.
//!
//! ```text
//! DRAFT ──submit──► SUBMITTED ──begin_review──► UNDER_REVIEW
//!                       │                            │
//!                       └──────► ACCEPTED | REJECTED ◄┘
//! ```
//!
//! Acceptance is the one write spanning two aggregates: the accepted row
//! and its PENDING payment go through [`AcceptanceUnitOfWork`] together and
//! the whole unit is retried on transient storage failures.

use crate::application::dto::NewQuotation;
use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::events::EventPublisher;
use crate::application::services::retry::RetryPolicy;
use crate::domain::entities::quotation::{Quotation, QuotationItemSpec};
use crate::domain::entities::reference::{Product, ProductDiscount};
use crate::domain::entities::{Payment, Rfq};
use crate::domain::events::{PaymentChange, PaymentEvent, QuotationChange, QuotationEvent};
use crate::domain::services::PricingCalculator;
use crate::domain::value_objects::{
    ItemDiscount, OrderId, ProductId, QuotationId, QuotationItemId, QuotationStatus, RfqId,
    SupplierId,
};
use crate::infrastructure::persistence::{
    AcceptanceUnitOfWork, PaymentRepository, QuotationFilter, QuotationRepository, RfqRepository,
};
use crate::infrastructure::reference_data::ReferenceDataGateway;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

/// Catalog record and tiers for one quoted line, fetched per call.
#[derive(Debug, Default)]
struct ProductContext {
    product: Option<Product>,
    tiers: Vec<ProductDiscount>,
}

/// Quotation lifecycle manager.
#[derive(Debug, Clone)]
pub struct QuotationService {
    rfqs: Arc<dyn RfqRepository>,
    quotations: Arc<dyn QuotationRepository>,
    payments: Arc<dyn PaymentRepository>,
    acceptance: Arc<dyn AcceptanceUnitOfWork>,
    reference: Arc<dyn ReferenceDataGateway>,
    events: EventPublisher,
    calculator: PricingCalculator,
    retry: RetryPolicy,
    currency: String,
}

impl QuotationService {
    /// Creates the service over its ports.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        rfqs: Arc<dyn RfqRepository>,
        quotations: Arc<dyn QuotationRepository>,
        payments: Arc<dyn PaymentRepository>,
        acceptance: Arc<dyn AcceptanceUnitOfWork>,
        reference: Arc<dyn ReferenceDataGateway>,
        events: EventPublisher,
        calculator: PricingCalculator,
        retry: RetryPolicy,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            rfqs,
            quotations,
            payments,
            acceptance,
            reference,
            events,
            calculator,
            retry,
            currency: currency.into(),
        }
    }

    /// Returns the calculator used for line pricing.
    #[must_use]
    pub fn calculator(&self) -> &PricingCalculator {
        &self.calculator
    }

    async fn load(&self, id: QuotationId) -> ApplicationResult<Quotation> {
        self.quotations
            .get(&id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Quotation", id))
    }

    async fn load_rfq(&self, id: RfqId) -> ApplicationResult<Rfq> {
        self.rfqs
            .get(&id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("RFQ", id))
    }

    async fn product_context(&self, product_id: Option<&ProductId>) -> ApplicationResult<ProductContext> {
        let Some(id) = product_id else {
            return Ok(ProductContext::default());
        };
        let product = self.reference.get_product(id).await?;
        let tiers = match product {
            Some(_) => self.reference.product_discounts(id).await?,
            None => Vec::new(),
        };
        Ok(ProductContext { product, tiers })
    }

    async fn tier_snapshot(
        &self,
        quotation: &Quotation,
    ) -> ApplicationResult<HashMap<ProductId, Vec<ProductDiscount>>> {
        let mut tiers = HashMap::new();
        for product_id in quotation.items().iter().filter_map(|i| i.product_id()) {
            if !tiers.contains_key(product_id) {
                let set = self.reference.product_discounts(product_id).await?;
                tiers.insert(product_id.clone(), set);
            }
        }
        Ok(tiers)
    }

    async fn items_changed(&self, quotation: &Quotation, item_id: QuotationItemId) {
        self.events
            .publish(QuotationEvent::new(
                quotation.id(),
                QuotationChange::ItemsChanged {
                    item_id,
                    preview_total: quotation.grand_total(),
                },
            ))
            .await;
    }

    /// Starts a supplier's first quotation on a published RFQ.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown RFQ, supplier or product
    /// - `InvalidState` unless the RFQ is published
    /// - `Forbidden` for an invitation-only RFQ without an active invitation
    /// - `Conflict` if the supplier already has a chain on this RFQ
    /// - `Validation` for a malformed initial item
    #[instrument(skip(self, request), fields(rfq_id = %rfq_id, supplier_id = %supplier_id))]
    pub async fn create(
        &self,
        rfq_id: RfqId,
        supplier_id: SupplierId,
        request: NewQuotation,
    ) -> ApplicationResult<Quotation> {
        let rfq = self.load_rfq(rfq_id).await?;
        if self.reference.get_supplier(&supplier_id).await?.is_none() {
            return Err(ApplicationError::not_found("Supplier", &supplier_id));
        }
        let mut quotation = Quotation::start(&rfq, supplier_id.clone(), request.notes)?;
        if rfq.rfq_type().requires_invitation() && !rfq.has_active_invitation(&supplier_id) {
            return Err(ApplicationError::forbidden(format!(
                "supplier {supplier_id} is not invited to RFQ {rfq_id}"
            )));
        }
        if !self.quotations.find_chain(&rfq_id, &supplier_id).await?.is_empty() {
            return Err(ApplicationError::conflict(format!(
                "supplier {supplier_id} already quoted on RFQ {rfq_id}; duplicate the current version instead"
            )));
        }
        for spec in request.items {
            let ctx = self.product_context(spec.product_id.as_ref()).await?;
            quotation.add_item(&rfq, spec, ctx.product.as_ref(), &self.calculator, &ctx.tiers)?;
        }

        self.quotations.insert(&quotation).await?;
        info!(quotation_id = %quotation.id(), items = quotation.items().len(), "quotation created");
        self.events
            .publish(QuotationEvent::new(
                quotation.id(),
                QuotationChange::Created {
                    rfq_id,
                    supplier_id,
                },
            ))
            .await;
        Ok(quotation)
    }

    /// Adds a priced line to a draft.
    ///
    /// # Errors
    ///
    /// `NotFound` for the quotation, RFQ or product, `InvalidState` unless
    /// draft, `Validation` for a foreign RFQ item, a product not offered by
    /// the supplier in the item's category, or an out-of-range discount.
    #[instrument(skip(self, spec), fields(quotation_id = %id, rfq_item_id = %spec.rfq_item_id))]
    pub async fn add_item(
        &self,
        id: QuotationId,
        spec: QuotationItemSpec,
    ) -> ApplicationResult<(Quotation, QuotationItemId)> {
        let mut quotation = self.load(id).await?;
        let rfq = self.load_rfq(quotation.rfq_id()).await?;
        let ctx = self.product_context(spec.product_id.as_ref()).await?;
        let expected = quotation.version();
        let item_id =
            quotation.add_item(&rfq, spec, ctx.product.as_ref(), &self.calculator, &ctx.tiers)?;
        self.quotations.update(&quotation, expected).await?;
        self.items_changed(&quotation, item_id).await;
        Ok((quotation, item_id))
    }

    /// Replaces a draft line, keeping its ID.
    ///
    /// # Errors
    ///
    /// As [`add_item`](Self::add_item), plus `NotFound` for an unknown line.
    #[instrument(skip(self, spec), fields(quotation_id = %id, %item_id))]
    pub async fn update_item(
        &self,
        id: QuotationId,
        item_id: QuotationItemId,
        spec: QuotationItemSpec,
    ) -> ApplicationResult<Quotation> {
        let mut quotation = self.load(id).await?;
        let rfq = self.load_rfq(quotation.rfq_id()).await?;
        let ctx = self.product_context(spec.product_id.as_ref()).await?;
        let expected = quotation.version();
        quotation.update_item(
            item_id,
            &rfq,
            spec,
            ctx.product.as_ref(),
            &self.calculator,
            &ctx.tiers,
        )?;
        self.quotations.update(&quotation, expected).await?;
        self.items_changed(&quotation, item_id).await;
        Ok(quotation)
    }

    /// Removes a draft line.
    ///
    /// # Errors
    ///
    /// `NotFound` for the quotation or line, `InvalidState` unless draft.
    #[instrument(skip(self), fields(quotation_id = %id, %item_id))]
    pub async fn delete_item(
        &self,
        id: QuotationId,
        item_id: QuotationItemId,
    ) -> ApplicationResult<Quotation> {
        let mut quotation = self.load(id).await?;
        let expected = quotation.version();
        quotation.remove_item(item_id, &self.calculator)?;
        self.quotations.update(&quotation, expected).await?;
        self.items_changed(&quotation, item_id).await;
        Ok(quotation)
    }

    /// Sets or clears a draft line's discount and reprices it.
    ///
    /// # Errors
    ///
    /// `NotFound` for the quotation or line, `InvalidState` unless draft,
    /// `Validation` for an out-of-range discount.
    #[instrument(skip(self, discount), fields(quotation_id = %id, %item_id))]
    pub async fn apply_discount(
        &self,
        id: QuotationId,
        item_id: QuotationItemId,
        discount: Option<ItemDiscount>,
    ) -> ApplicationResult<Quotation> {
        let mut quotation = self.load(id).await?;
        let product_id = quotation
            .items()
            .iter()
            .find(|i| i.id() == item_id)
            .and_then(|i| i.product_id().cloned());
        let ctx = self.product_context(product_id.as_ref()).await?;
        let expected = quotation.version();
        quotation.apply_discount(item_id, discount, &self.calculator, &ctx.tiers)?;
        self.quotations.update(&quotation, expected).await?;
        self.items_changed(&quotation, item_id).await;
        Ok(quotation)
    }

    /// Submits a draft, repricing every line against fresh discount tiers.
    ///
    /// # Errors
    ///
    /// `NotFound`, `InvalidState` unless a draft with items on a published
    /// RFQ before its deadline, `Conflict` on a concurrent write.
    #[instrument(skip(self), fields(quotation_id = %id))]
    pub async fn submit(&self, id: QuotationId) -> ApplicationResult<Quotation> {
        let mut quotation = self.load(id).await?;
        let rfq = self.load_rfq(quotation.rfq_id()).await?;
        let tiers = self.tier_snapshot(&quotation).await?;
        let expected = quotation.version();
        quotation.submit(&rfq, &self.calculator, &tiers)?;
        self.quotations.update(&quotation, expected).await?;
        info!(grand_total = %quotation.grand_total(), "quotation submitted");
        self.events
            .publish(QuotationEvent::new(
                id,
                QuotationChange::Submitted {
                    grand_total: quotation.grand_total(),
                },
            ))
            .await;
        Ok(quotation)
    }

    /// Moves a submitted quotation under review.
    ///
    /// # Errors
    ///
    /// `NotFound`, or `InvalidState` unless submitted.
    #[instrument(skip(self), fields(quotation_id = %id))]
    pub async fn begin_review(&self, id: QuotationId) -> ApplicationResult<Quotation> {
        let mut quotation = self.load(id).await?;
        let expected = quotation.version();
        quotation.begin_review()?;
        self.quotations.update(&quotation, expected).await?;
        info!("quotation under review");
        self.events
            .publish(QuotationEvent::new(id, QuotationChange::ReviewStarted))
            .await;
        Ok(quotation)
    }

    async fn try_accept(&self, id: QuotationId) -> ApplicationResult<(Quotation, Payment)> {
        let mut quotation = self.load(id).await?;
        let rfq = self.load_rfq(quotation.rfq_id()).await?;
        let expected = quotation.version();
        quotation.accept(&rfq)?;

        let chain = self
            .quotations
            .find_chain(&quotation.rfq_id(), quotation.supplier_id())
            .await?;
        if let Some(accepted) = chain
            .iter()
            .find(|q| q.id() != id && q.status() == QuotationStatus::Accepted)
        {
            return Err(ApplicationError::conflict(format!(
                "version {} of this quotation is already accepted",
                accepted.version_number()
            )));
        }
        let order_id = OrderId::from(id);
        if self.payments.get_by_order(&order_id).await?.is_some() {
            return Err(ApplicationError::conflict(format!(
                "order {order_id} already has a payment"
            )));
        }

        let payment = Payment::new(
            order_id,
            quotation.company_id().clone(),
            quotation.grand_total(),
            self.currency.as_str(),
        )?;
        self.acceptance
            .commit_acceptance(&quotation, expected, &payment)
            .await?;
        Ok((quotation, payment))
    }

    /// Accepts a submitted or reviewed quotation and opens its payment.
    ///
    /// # Errors
    ///
    /// - `NotFound` for the quotation or its RFQ
    /// - `InvalidState` unless submitted or under review, or if the RFQ was
    ///   cancelled
    /// - `Conflict` if another version is accepted or the order already has
    ///   a payment
    /// - `Validation` for a zero grand total
    #[instrument(skip(self), fields(quotation_id = %id))]
    pub async fn accept(&self, id: QuotationId) -> ApplicationResult<(Quotation, Payment)> {
        let (quotation, payment) = self
            .retry
            .run("accept_quotation", || self.try_accept(id))
            .await?;
        info!(
            payment_id = %payment.id(),
            amount = %payment.amount(),
            "quotation accepted"
        );
        self.events
            .publish(QuotationEvent::new(
                id,
                QuotationChange::Accepted {
                    payment_id: payment.id(),
                    amount: payment.amount(),
                },
            ))
            .await;
        self.events
            .publish(PaymentEvent::new(
                payment.id(),
                PaymentChange::Created {
                    order_id: payment.order_id(),
                    amount: payment.amount(),
                    currency: payment.currency().to_string(),
                },
            ))
            .await;
        Ok((quotation, payment))
    }

    /// Rejects a submitted or reviewed quotation.
    ///
    /// # Errors
    ///
    /// `NotFound`, `InvalidState` unless reviewable, `Validation` for a
    /// blank reason.
    #[instrument(skip(self, reason), fields(quotation_id = %id))]
    pub async fn reject(&self, id: QuotationId, reason: impl Into<String>) -> ApplicationResult<Quotation> {
        let reason = reason.into();
        let mut quotation = self.load(id).await?;
        let expected = quotation.version();
        quotation.reject(reason.clone())?;
        self.quotations.update(&quotation, expected).await?;
        info!("quotation rejected");
        self.events
            .publish(QuotationEvent::new(id, QuotationChange::Rejected { reason }))
            .await;
        Ok(quotation)
    }

    /// Copies a quotation into a new draft version of its chain.
    ///
    /// The new row becomes current and the prior current row is demoted in
    /// the same store operation.
    ///
    /// # Errors
    ///
    /// `NotFound`, or `Conflict` if the chain moved on concurrently.
    #[instrument(skip(self), fields(quotation_id = %id))]
    pub async fn duplicate(&self, id: QuotationId) -> ApplicationResult<Quotation> {
        let source = self.load(id).await?;
        let chain = self
            .quotations
            .find_chain(&source.rfq_id(), source.supplier_id())
            .await?;
        let mut current = chain
            .iter()
            .find(|q| q.is_current())
            .cloned()
            .ok_or_else(|| {
                ApplicationError::invalid_state(format!("quotation chain of {id} has no current version"))
            })?;
        let version_number = Quotation::next_version_number(&chain)?;
        let revision = source.revision(version_number, current.id());
        let expected = current.version();
        current.mark_superseded();

        self.quotations
            .insert_revision(&revision, &current, expected)
            .await?;
        info!(
            revision_id = %revision.id(),
            version_number,
            previous_id = %current.id(),
            "quotation revised"
        );
        self.events
            .publish(QuotationEvent::new(
                revision.id(),
                QuotationChange::Revised {
                    previous_id: current.id(),
                    version_number,
                },
            ))
            .await;
        Ok(revision)
    }

    /// Hard-deletes a quotation row.
    ///
    /// Deleting the current row promotes the newest remaining version.
    ///
    /// # Errors
    ///
    /// `NotFound`, or `Conflict` if the row is accepted or the chain moved
    /// on concurrently.
    #[instrument(skip(self), fields(quotation_id = %id))]
    pub async fn delete(&self, id: QuotationId) -> ApplicationResult<()> {
        let quotation = self.load(id).await?;
        quotation.ensure_deletable()?;

        let promoted = if quotation.is_current() {
            self.quotations
                .find_chain(&quotation.rfq_id(), quotation.supplier_id())
                .await?
                .into_iter()
                .filter(|q| q.id() != id)
                .max_by_key(Quotation::version_number)
                .map(|mut q| {
                    let expected = q.version();
                    q.mark_current();
                    (q, expected)
                })
        } else {
            None
        };

        self.quotations
            .delete_revision(
                &id,
                quotation.version(),
                promoted.as_ref().map(|(q, expected)| (q, *expected)),
            )
            .await?;
        let promoted_id = promoted.map(|(q, _)| q.id());
        info!(promoted_id = ?promoted_id, "quotation deleted");
        self.events
            .publish(QuotationEvent::new(id, QuotationChange::Deleted { promoted_id }))
            .await;
        Ok(())
    }

    /// Gets a quotation row.
    ///
    /// # Errors
    ///
    /// `NotFound` if unknown.
    #[instrument(skip(self), fields(quotation_id = %id))]
    pub async fn get(&self, id: QuotationId) -> ApplicationResult<Quotation> {
        self.load(id).await
    }

    /// Lists quotation rows, oldest first.
    ///
    /// # Errors
    ///
    /// `Infrastructure` on storage failure.
    #[instrument(skip(self))]
    pub async fn list(&self, filter: QuotationFilter) -> ApplicationResult<Vec<Quotation>> {
        Ok(self.quotations.list(&filter).await?)
    }

    /// Lists every version of a supplier's chain, by version number.
    ///
    /// # Errors
    ///
    /// `Infrastructure` on storage failure.
    #[instrument(skip(self), fields(rfq_id = %rfq_id, supplier_id = %supplier_id))]
    pub async fn list_versions(
        &self,
        rfq_id: RfqId,
        supplier_id: &SupplierId,
    ) -> ApplicationResult<Vec<Quotation>> {
        Ok(self.quotations.find_chain(&rfq_id, supplier_id).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::application::error::ErrorKind;
    use crate::domain::entities::reference::{Company, Supplier};
    use crate::domain::entities::rfq::RfqItemSpec;
    use crate::domain::value_objects::{CompanyId, Price, Quantity, RfqType};
    use crate::infrastructure::persistence::in_memory::{
        InMemoryAcceptanceUnit, InMemoryEventStore, InMemoryPaymentRepository,
        InMemoryQuotationRepository, InMemoryRfqRepository,
    };
    use crate::infrastructure::persistence::{RepositoryError, RepositoryResult};
    use crate::infrastructure::reference_data::InMemoryReferenceData;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Fails the first `failures` commits with a connection error.
    #[derive(Debug)]
    struct FlakyAcceptance {
        inner: InMemoryAcceptanceUnit,
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl AcceptanceUnitOfWork for FlakyAcceptance {
        async fn commit_acceptance(
            &self,
            quotation: &Quotation,
            expected_version: u64,
            payment: &Payment,
        ) -> RepositoryResult<()> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
                return Err(RepositoryError::connection("connection reset"));
            }
            self.inner
                .commit_acceptance(quotation, expected_version, payment)
                .await
        }
    }

    struct Setup {
        service: QuotationService,
        rfqs: Arc<InMemoryRfqRepository>,
        payments: Arc<InMemoryPaymentRepository>,
        acceptance: Arc<FlakyAcceptance>,
    }

    fn setup(failures: u32, attempts: u32) -> Setup {
        let rfqs = Arc::new(InMemoryRfqRepository::new());
        let quotations = InMemoryQuotationRepository::new();
        let payments = InMemoryPaymentRepository::new();
        let acceptance = Arc::new(FlakyAcceptance {
            inner: InMemoryAcceptanceUnit::new(&quotations, &payments),
            failures,
            calls: AtomicU32::new(0),
        });
        let payments = Arc::new(payments);
        let reference = Arc::new(
            InMemoryReferenceData::new()
                .with_company(Company::new("acme", "Acme"))
                .with_supplier(Supplier::new("s-1", "Globex")),
        );
        let service = QuotationService::new(
            rfqs.clone(),
            Arc::new(quotations),
            payments.clone(),
            acceptance.clone(),
            reference,
            EventPublisher::new(Arc::new(InMemoryEventStore::new())),
            PricingCalculator::default(),
            RetryPolicy::new(attempts, Duration::from_millis(1), Duration::from_millis(2)),
            "EUR",
        );
        Setup {
            service,
            rfqs,
            payments,
            acceptance,
        }
    }

    async fn submitted(setup: &Setup) -> Quotation {
        let mut rfq = Rfq::new(CompanyId::new("acme"), "Pens", "", RfqType::Open, None).unwrap();
        let item = rfq
            .add_item(RfqItemSpec::new("office", Quantity::from_units(4).unwrap(), "box"))
            .unwrap();
        rfq.publish().unwrap();
        setup.rfqs.insert(&rfq).await.unwrap();

        let spec = QuotationItemSpec::new(
            item,
            Price::new(Decimal::new(25, 0)).unwrap(),
            Quantity::from_units(4).unwrap(),
        );
        let q = setup
            .service
            .create(rfq.id(), SupplierId::new("s-1"), NewQuotation::new().item(spec))
            .await
            .unwrap();
        setup.service.submit(q.id()).await.unwrap()
    }

    #[tokio::test]
    async fn acceptance_retries_transient_failures() {
        let setup = setup(2, 3);
        let q = submitted(&setup).await;

        let (accepted, payment) = setup.service.accept(q.id()).await.unwrap();

        assert_eq!(accepted.status(), QuotationStatus::Accepted);
        assert_eq!(payment.currency(), "EUR");
        assert_eq!(payment.amount(), Price::new(Decimal::new(100, 0)).unwrap());
        assert_eq!(setup.acceptance.calls.load(Ordering::SeqCst), 3);
        assert!(
            setup
                .payments
                .get_by_order(&OrderId::from(q.id()))
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn acceptance_gives_up_and_writes_nothing() {
        let setup = setup(5, 2);
        let q = submitted(&setup).await;

        let err = setup.service.accept(q.id()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Infrastructure);
        assert_eq!(setup.acceptance.calls.load(Ordering::SeqCst), 2);
        let stored = setup.service.get(q.id()).await.unwrap();
        assert_eq!(stored.status(), QuotationStatus::Submitted);
        assert!(
            setup
                .payments
                .get_by_order(&OrderId::from(q.id()))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn create_with_unknown_rfq_is_not_found() {
        let setup = setup(0, 1);
        let err = setup
            .service
            .create(RfqId::new_v4(), SupplierId::new("s-1"), NewQuotation::new())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn duplicate_copies_items_into_new_draft() {
        let setup = setup(0, 1);
        let q = submitted(&setup).await;

        let revision = setup.service.duplicate(q.id()).await.unwrap();

        assert_eq!(revision.version_number(), 2);
        assert_eq!(revision.status(), QuotationStatus::Draft);
        assert_eq!(revision.items().len(), 1);
        assert_ne!(revision.items()[0].id(), q.items()[0].id());
        assert!(!setup.service.get(q.id()).await.unwrap().is_current());
    }
}
