//! # Quotation Aggregate Root
//!
//! A supplier's priced answer to an RFQ.
//!
//! Quotations form version chains per `(RFQ, supplier)`: revising a
//! quotation creates a new draft row with the next version number and a
//! back link to the prior current row. Exactly one row per chain carries
//! `is_current = true`.
//!
//! # State Machine
//!
//! ```text
//! Draft → Submitted → UnderReview
//!            ↓             ↓
//!            └─────────────┴→ Accepted | Rejected
//! ```
//!
//! Line totals are priced as soon as an item is written so a draft always
//! shows a preview total. Submission reprices every line against a fresh
//! discount snapshot and freezes the grand total.

use crate::domain::entities::reference::{Product, ProductDiscount};
use crate::domain::entities::rfq::{Rfq, RfqItem};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::services::pricing::PricingCalculator;
use crate::domain::value_objects::arithmetic::CheckedArithmetic;
use crate::domain::value_objects::timestamp::Timestamp;
use crate::domain::value_objects::{
    CompanyId, DiscountId, ItemDiscount, Price, ProductId, Quantity, QuotationId,
    QuotationItemId, QuotationStatus, RfqId, RfqItemId, RfqStatus, SupplierId,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Caller-supplied contents of a quotation line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotationItemSpec {
    /// RFQ line this offer answers.
    pub rfq_item_id: RfqItemId,
    /// Catalog product offered, if any.
    pub product_id: Option<ProductId>,
    /// Offered unit price.
    pub unit_price: Price,
    /// Offered quantity.
    pub quantity: Quantity,
    /// Line-level discount.
    pub discount: Option<ItemDiscount>,
}

impl QuotationItemSpec {
    /// Creates a line spec without product or discount.
    #[must_use]
    pub fn new(rfq_item_id: RfqItemId, unit_price: Price, quantity: Quantity) -> Self {
        Self {
            rfq_item_id,
            product_id: None,
            unit_price,
            quantity,
            discount: None,
        }
    }

    /// Sets the offered product.
    #[must_use]
    pub fn with_product(mut self, product_id: impl Into<ProductId>) -> Self {
        self.product_id = Some(product_id.into());
        self
    }

    /// Sets the line discount.
    #[must_use]
    pub fn with_discount(mut self, discount: ItemDiscount) -> Self {
        self.discount = Some(discount);
        self
    }
}

/// A priced line on a quotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotationItem {
    id: QuotationItemId,
    rfq_item_id: RfqItemId,
    product_id: Option<ProductId>,
    unit_price: Price,
    quantity: Quantity,
    discount: Option<ItemDiscount>,
    applied_discount_id: Option<DiscountId>,
    line_total: Price,
}

impl QuotationItem {
    /// Returns the item ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> QuotationItemId {
        self.id
    }

    /// Returns the answered RFQ line.
    #[inline]
    #[must_use]
    pub fn rfq_item_id(&self) -> RfqItemId {
        self.rfq_item_id
    }

    /// Returns the offered product, if any.
    #[inline]
    #[must_use]
    pub fn product_id(&self) -> Option<&ProductId> {
        self.product_id.as_ref()
    }

    /// Returns the unit price.
    #[inline]
    #[must_use]
    pub fn unit_price(&self) -> Price {
        self.unit_price
    }

    /// Returns the offered quantity.
    #[inline]
    #[must_use]
    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Returns the line discount, if any.
    #[inline]
    #[must_use]
    pub fn discount(&self) -> Option<&ItemDiscount> {
        self.discount.as_ref()
    }

    /// Returns the product tier applied at the last pricing.
    #[inline]
    #[must_use]
    pub fn applied_discount_id(&self) -> Option<&DiscountId> {
        self.applied_discount_id.as_ref()
    }

    /// Returns the line total from the last pricing.
    #[inline]
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.line_total
    }

    fn price(
        &mut self,
        calculator: &PricingCalculator,
        tiers: &[ProductDiscount],
        at: Timestamp,
    ) -> DomainResult<()> {
        let own_tiers: Vec<ProductDiscount> = tiers
            .iter()
            .filter(|tier| self.product_id.as_ref() == Some(&tier.product_id))
            .cloned()
            .collect();
        let priced = calculator.effective_price(
            self.unit_price,
            self.quantity,
            self.discount.as_ref(),
            &own_tiers,
            at,
        )?;
        self.line_total = priced.line_total;
        self.applied_discount_id = priced.applied_discount_id;
        Ok(())
    }
}

/// Quotation aggregate root.
///
/// # Invariants
///
/// - Every item answers an item of the same RFQ, at most one item per RFQ line
/// - Items change only while draft
/// - Submission requires at least one item
/// - `grand_total` is the sum of the item line totals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quotation {
    id: QuotationId,
    rfq_id: RfqId,
    supplier_id: SupplierId,
    company_id: CompanyId,
    version_number: u32,
    is_current: bool,
    previous_version_id: Option<QuotationId>,
    status: QuotationStatus,
    notes: String,
    items: Vec<QuotationItem>,
    grand_total: Price,
    submitted_at: Option<Timestamp>,
    reviewed_at: Option<Timestamp>,
    decided_at: Option<Timestamp>,
    rejection_reason: Option<String>,
    /// Version for optimistic locking.
    version: u64,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Quotation {
    /// Starts the first version of a supplier's chain on a published RFQ.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidState` unless the RFQ is published.
    pub fn start(rfq: &Rfq, supplier_id: SupplierId, notes: impl Into<String>) -> DomainResult<Self> {
        if !rfq.status().accepts_quotations() {
            return Err(DomainError::invalid_state(format!(
                "RFQ {} is {} and does not accept quotations",
                rfq.id(),
                rfq.status()
            )));
        }
        let now = Timestamp::now();
        Ok(Self {
            id: QuotationId::new_v4(),
            rfq_id: rfq.id(),
            supplier_id,
            company_id: rfq.company_id().clone(),
            version_number: 1,
            is_current: true,
            previous_version_id: None,
            status: QuotationStatus::Draft,
            notes: notes.into(),
            items: Vec::new(),
            grand_total: Price::ZERO,
            submitted_at: None,
            reviewed_at: None,
            decided_at: None,
            rejection_reason: None,
            version: 1,
            created_at: now,
            updated_at: now,
        })
    }

    /// Creates the next draft version of this quotation's chain.
    ///
    /// Items are copied with fresh IDs. The caller demotes the prior current
    /// row in the same store operation.
    #[must_use]
    pub fn revision(&self, version_number: u32, previous_current: QuotationId) -> Self {
        let now = Timestamp::now();
        let items = self
            .items
            .iter()
            .map(|item| QuotationItem {
                id: QuotationItemId::new_v4(),
                ..item.clone()
            })
            .collect();
        Self {
            id: QuotationId::new_v4(),
            rfq_id: self.rfq_id,
            supplier_id: self.supplier_id.clone(),
            company_id: self.company_id.clone(),
            version_number,
            is_current: true,
            previous_version_id: Some(previous_current),
            status: QuotationStatus::Draft,
            notes: self.notes.clone(),
            items,
            grand_total: self.grand_total,
            submitted_at: None,
            reviewed_at: None,
            decided_at: None,
            rejection_reason: None,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the version number following the highest one in `chain`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Arithmetic` if the chain is exhausted.
    pub fn next_version_number(chain: &[Self]) -> DomainResult<u32> {
        let max = chain.iter().map(|q| q.version_number).max().unwrap_or(0);
        Ok(max.safe_add(1)?)
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
        self.version = self.version.saturating_add(1);
    }

    fn transition_to(&mut self, target: QuotationStatus) -> DomainResult<()> {
        if !self.status.can_transition_to(target) {
            return Err(DomainError::transition("Quotation", self.status, target));
        }
        self.status = target;
        self.touch();
        Ok(())
    }

    fn ensure_editable(&self) -> DomainResult<()> {
        if !self.status.is_editable() {
            return Err(DomainError::invalid_state(format!(
                "quotation {} is {} and can no longer be edited",
                self.id, self.status
            )));
        }
        Ok(())
    }

    fn ensure_reviewable(&self, action: &str) -> DomainResult<()> {
        if !self.status.is_reviewable() {
            return Err(DomainError::invalid_state(format!(
                "cannot {action} quotation {} in status {}",
                self.id, self.status
            )));
        }
        Ok(())
    }

    fn recompute_total(&mut self, calculator: &PricingCalculator) -> DomainResult<()> {
        self.grand_total = calculator.grand_total(self.items.iter().map(|i| i.line_total))?;
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Returns the quotation ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> QuotationId {
        self.id
    }

    /// Returns the answered RFQ.
    #[inline]
    #[must_use]
    pub fn rfq_id(&self) -> RfqId {
        self.rfq_id
    }

    /// Returns the quoting supplier.
    #[inline]
    #[must_use]
    pub fn supplier_id(&self) -> &SupplierId {
        &self.supplier_id
    }

    /// Returns the RFQ's company.
    #[inline]
    #[must_use]
    pub fn company_id(&self) -> &CompanyId {
        &self.company_id
    }

    /// Returns the position of this row in its chain, starting at 1.
    #[inline]
    #[must_use]
    pub fn version_number(&self) -> u32 {
        self.version_number
    }

    /// Returns true if this row is the chain's current version.
    #[inline]
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.is_current
    }

    /// Returns the row this one was revised from.
    #[inline]
    #[must_use]
    pub fn previous_version_id(&self) -> Option<QuotationId> {
        self.previous_version_id
    }

    /// Returns the lifecycle status.
    #[inline]
    #[must_use]
    pub fn status(&self) -> QuotationStatus {
        self.status
    }

    /// Returns the supplier's notes.
    #[inline]
    #[must_use]
    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// Returns the lines in insertion order.
    #[inline]
    #[must_use]
    pub fn items(&self) -> &[QuotationItem] {
        &self.items
    }

    /// Returns the line answering `rfq_item_id`, if any.
    #[must_use]
    pub fn item_for(&self, rfq_item_id: RfqItemId) -> Option<&QuotationItem> {
        self.items.iter().find(|i| i.rfq_item_id == rfq_item_id)
    }

    /// Returns the grand total.
    #[inline]
    #[must_use]
    pub fn grand_total(&self) -> Price {
        self.grand_total
    }

    /// Returns when the quotation was submitted.
    #[inline]
    #[must_use]
    pub fn submitted_at(&self) -> Option<Timestamp> {
        self.submitted_at
    }

    /// Returns when review began.
    #[inline]
    #[must_use]
    pub fn reviewed_at(&self) -> Option<Timestamp> {
        self.reviewed_at
    }

    /// Returns when the quotation was accepted or rejected.
    #[inline]
    #[must_use]
    pub fn decided_at(&self) -> Option<Timestamp> {
        self.decided_at
    }

    /// Returns the rejection reason.
    #[inline]
    #[must_use]
    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    /// Returns the version for optimistic locking.
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns when this row was created.
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Returns when this row was last updated.
    #[inline]
    #[must_use]
    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    // ========================================================================
    // Items
    // ========================================================================

    fn resolve_rfq_item<'r>(&self, rfq: &'r Rfq, rfq_item_id: RfqItemId) -> DomainResult<&'r RfqItem> {
        if rfq.id() != self.rfq_id {
            return Err(DomainError::validation(format!(
                "RFQ {} is not the RFQ of quotation {}",
                rfq.id(),
                self.id
            )));
        }
        rfq.item(rfq_item_id).ok_or_else(|| {
            DomainError::validation(format!(
                "RFQ item {rfq_item_id} does not belong to RFQ {}",
                self.rfq_id
            ))
        })
    }

    fn check_product(
        &self,
        spec: &QuotationItemSpec,
        rfq_item: &RfqItem,
        product: Option<&Product>,
    ) -> DomainResult<()> {
        match (&spec.product_id, product) {
            (None, _) => Ok(()),
            (Some(id), None) => Err(DomainError::not_found("product", id)),
            (Some(id), Some(product)) => {
                if &product.id != id {
                    return Err(DomainError::not_found("product", id));
                }
                if !product.is_offered_by(&self.supplier_id, rfq_item.category_id()) {
                    return Err(DomainError::validation(format!(
                        "product {id} is not offered by supplier {} in category {}",
                        self.supplier_id,
                        rfq_item.category_id()
                    )));
                }
                Ok(())
            }
        }
    }

    /// Adds a priced line.
    ///
    /// `product` is the catalog record for `spec.product_id` and `tiers` its
    /// current discount set.
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidState` unless draft
    /// - `DomainError::Validation` if the RFQ line is foreign or already
    ///   answered, the product does not match supplier and category, or the
    ///   discount is out of range
    /// - `DomainError::NotFound` if a referenced product is missing
    pub fn add_item(
        &mut self,
        rfq: &Rfq,
        spec: QuotationItemSpec,
        product: Option<&Product>,
        calculator: &PricingCalculator,
        tiers: &[ProductDiscount],
    ) -> DomainResult<QuotationItemId> {
        self.ensure_editable()?;
        let rfq_item = self.resolve_rfq_item(rfq, spec.rfq_item_id)?;
        if self.item_for(spec.rfq_item_id).is_some() {
            return Err(DomainError::validation(format!(
                "RFQ item {} is already quoted on quotation {}",
                spec.rfq_item_id, self.id
            )));
        }
        self.check_product(&spec, rfq_item, product)?;

        let mut item = QuotationItem {
            id: QuotationItemId::new_v4(),
            rfq_item_id: spec.rfq_item_id,
            product_id: spec.product_id,
            unit_price: spec.unit_price,
            quantity: spec.quantity,
            discount: spec.discount,
            applied_discount_id: None,
            line_total: Price::ZERO,
        };
        item.price(calculator, tiers, Timestamp::now())?;
        let id = item.id;
        self.items.push(item);
        self.recompute_total(calculator)?;
        self.touch();
        Ok(id)
    }

    /// Replaces a line's contents, keeping its ID.
    ///
    /// # Errors
    ///
    /// As [`add_item`](Self::add_item), plus `DomainError::NotFound` for an
    /// unknown line.
    pub fn update_item(
        &mut self,
        item_id: QuotationItemId,
        rfq: &Rfq,
        spec: QuotationItemSpec,
        product: Option<&Product>,
        calculator: &PricingCalculator,
        tiers: &[ProductDiscount],
    ) -> DomainResult<()> {
        self.ensure_editable()?;
        if !self.items.iter().any(|i| i.id == item_id) {
            return Err(DomainError::not_found("quotation item", item_id));
        }
        let rfq_item = self.resolve_rfq_item(rfq, spec.rfq_item_id)?;
        if self
            .items
            .iter()
            .any(|i| i.id != item_id && i.rfq_item_id == spec.rfq_item_id)
        {
            return Err(DomainError::validation(format!(
                "RFQ item {} is already quoted on quotation {}",
                spec.rfq_item_id, self.id
            )));
        }
        self.check_product(&spec, rfq_item, product)?;

        let mut item = QuotationItem {
            id: item_id,
            rfq_item_id: spec.rfq_item_id,
            product_id: spec.product_id,
            unit_price: spec.unit_price,
            quantity: spec.quantity,
            discount: spec.discount,
            applied_discount_id: None,
            line_total: Price::ZERO,
        };
        item.price(calculator, tiers, Timestamp::now())?;
        if let Some(slot) = self.items.iter_mut().find(|i| i.id == item_id) {
            *slot = item;
        }
        self.recompute_total(calculator)?;
        self.touch();
        Ok(())
    }

    /// Removes a line.
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidState` unless draft
    /// - `DomainError::NotFound` for an unknown line
    pub fn remove_item(
        &mut self,
        item_id: QuotationItemId,
        calculator: &PricingCalculator,
    ) -> DomainResult<()> {
        self.ensure_editable()?;
        let before = self.items.len();
        self.items.retain(|i| i.id != item_id);
        if self.items.len() == before {
            return Err(DomainError::not_found("quotation item", item_id));
        }
        self.recompute_total(calculator)?;
        self.touch();
        Ok(())
    }

    /// Sets or clears a line's discount and reprices it.
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidState` unless draft
    /// - `DomainError::NotFound` for an unknown line
    /// - `DomainError::Validation` for an out-of-range discount
    pub fn apply_discount(
        &mut self,
        item_id: QuotationItemId,
        discount: Option<ItemDiscount>,
        calculator: &PricingCalculator,
        tiers: &[ProductDiscount],
    ) -> DomainResult<()> {
        self.ensure_editable()?;
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| DomainError::not_found("quotation item", item_id))?;
        let mut repriced = item.clone();
        repriced.discount = discount;
        repriced.price(calculator, tiers, Timestamp::now())?;
        *item = repriced;
        self.recompute_total(calculator)?;
        self.touch();
        Ok(())
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Submits the quotation to the company.
    ///
    /// Every line is repriced against `tiers`, the discount sets of the
    /// offered products as fetched for this submission.
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidStateTransition` unless draft
    /// - `DomainError::InvalidState` without items, or if the RFQ is no
    ///   longer published or its deadline has passed
    pub fn submit(
        &mut self,
        rfq: &Rfq,
        calculator: &PricingCalculator,
        tiers: &HashMap<ProductId, Vec<ProductDiscount>>,
    ) -> DomainResult<()> {
        if !self.status.can_transition_to(QuotationStatus::Submitted) {
            return Err(DomainError::transition(
                "Quotation",
                self.status,
                QuotationStatus::Submitted,
            ));
        }
        if self.items.is_empty() {
            return Err(DomainError::invalid_state(format!(
                "quotation {} has no items",
                self.id
            )));
        }
        if rfq.id() != self.rfq_id {
            return Err(DomainError::validation("quotation belongs to another RFQ"));
        }
        if rfq.status() != RfqStatus::Published {
            return Err(DomainError::invalid_state(format!(
                "RFQ {} is {} and no longer accepts submissions",
                rfq.id(),
                rfq.status()
            )));
        }
        let now = Timestamp::now();
        if rfq.is_past_deadline(now) {
            return Err(DomainError::invalid_state(format!(
                "RFQ {} deadline has passed",
                rfq.id()
            )));
        }

        let mut repriced = self.items.clone();
        for item in &mut repriced {
            let product_tiers = item
                .product_id
                .as_ref()
                .and_then(|id| tiers.get(id))
                .map_or(&[][..], Vec::as_slice);
            item.price(calculator, product_tiers, now)?;
        }
        self.items = repriced;
        self.recompute_total(calculator)?;
        self.transition_to(QuotationStatus::Submitted)?;
        self.submitted_at = Some(now);
        Ok(())
    }

    /// Marks the quotation as under review by the company.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStateTransition` unless submitted.
    pub fn begin_review(&mut self) -> DomainResult<()> {
        self.transition_to(QuotationStatus::UnderReview)?;
        self.reviewed_at = Some(self.updated_at);
        Ok(())
    }

    /// Accepts the quotation.
    ///
    /// Chain-wide and payment uniqueness are checked by the caller against
    /// the store.
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidState` unless submitted or under review, or if
    ///   the RFQ was cancelled
    pub fn accept(&mut self, rfq: &Rfq) -> DomainResult<()> {
        self.ensure_reviewable("accept")?;
        if rfq.status() == RfqStatus::Cancelled {
            return Err(DomainError::invalid_state(format!(
                "RFQ {} was cancelled",
                rfq.id()
            )));
        }
        self.transition_to(QuotationStatus::Accepted)?;
        self.decided_at = Some(self.updated_at);
        Ok(())
    }

    /// Rejects the quotation with a reason.
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidState` unless submitted or under review
    /// - `DomainError::Validation` for a blank reason
    pub fn reject(&mut self, reason: impl Into<String>) -> DomainResult<()> {
        self.ensure_reviewable("reject")?;
        let reason = reason.into();
        if reason.trim().is_empty() {
            return Err(DomainError::validation("rejection reason must not be empty"));
        }
        self.transition_to(QuotationStatus::Rejected)?;
        self.rejection_reason = Some(reason);
        self.decided_at = Some(self.updated_at);
        Ok(())
    }

    /// Clears the current flag when a newer version takes over.
    pub fn mark_superseded(&mut self) {
        self.is_current = false;
        self.touch();
    }

    /// Sets the current flag when a newer version is deleted.
    pub fn mark_current(&mut self) {
        self.is_current = true;
        self.touch();
    }

    /// Ensures the row may be hard-deleted.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Conflict` for an accepted quotation.
    pub fn ensure_deletable(&self) -> DomainResult<()> {
        if self.status == QuotationStatus::Accepted {
            return Err(DomainError::conflict(format!(
                "quotation {} is accepted and cannot be deleted",
                self.id
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Quotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Quotation({} rfq={} supplier={} v{} total={} [{}])",
            self.id,
            self.rfq_id,
            self.supplier_id,
            self.version_number,
            self.grand_total,
            self.status
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::entities::reference::DiscountKind;
    use crate::domain::entities::rfq::RfqItemSpec;
    use crate::domain::value_objects::{CategoryId, RfqType};
    use rust_decimal::Decimal;

    fn price(s: &str) -> Price {
        s.parse().unwrap()
    }

    fn qty(n: u64) -> Quantity {
        Quantity::from_units(n).unwrap()
    }

    fn published_rfq() -> Rfq {
        let mut rfq = Rfq::builder(CompanyId::new("acme"), "Stationery")
            .rfq_type(RfqType::Open)
            .build()
            .unwrap();
        rfq.add_item(RfqItemSpec::new("paper", qty(10), "box")).unwrap();
        rfq.add_item(RfqItemSpec::new("pens", qty(100), "pc")).unwrap();
        rfq.publish().unwrap();
        rfq
    }

    fn draft_for(rfq: &Rfq) -> Quotation {
        Quotation::start(rfq, SupplierId::new("s1"), "").unwrap()
    }

    fn calc() -> PricingCalculator {
        PricingCalculator::default()
    }

    fn line(rfq: &Rfq, index: usize, unit: &str, units: u64) -> QuotationItemSpec {
        QuotationItemSpec::new(rfq.items()[index].id(), price(unit), qty(units))
    }

    mod construction {
        use super::*;

        #[test]
        fn starts_as_current_first_version() {
            let rfq = published_rfq();
            let q = draft_for(&rfq);
            assert_eq!(q.version_number(), 1);
            assert!(q.is_current());
            assert_eq!(q.status(), QuotationStatus::Draft);
            assert_eq!(q.company_id(), rfq.company_id());
        }

        #[test]
        fn draft_rfq_rejects_quotations() {
            let rfq = Rfq::builder(CompanyId::new("acme"), "t").build().unwrap();
            assert!(matches!(
                Quotation::start(&rfq, SupplierId::new("s1"), ""),
                Err(DomainError::InvalidState(_))
            ));
        }
    }

    mod items {
        use super::*;

        #[test]
        fn lines_are_priced_immediately() {
            let rfq = published_rfq();
            let mut q = draft_for(&rfq);
            q.add_item(&rfq, line(&rfq, 0, "4.50", 10), None, &calc(), &[]).unwrap();
            assert_eq!(q.items()[0].line_total(), price("45"));
            assert_eq!(q.grand_total(), price("45"));
        }

        #[test]
        fn foreign_rfq_item_is_validation_error() {
            let rfq = published_rfq();
            let mut q = draft_for(&rfq);
            let spec = QuotationItemSpec::new(RfqItemId::new_v4(), price("1"), qty(1));
            assert!(matches!(
                q.add_item(&rfq, spec, None, &calc(), &[]),
                Err(DomainError::Validation(_))
            ));
        }

        #[test]
        fn one_line_per_rfq_item() {
            let rfq = published_rfq();
            let mut q = draft_for(&rfq);
            q.add_item(&rfq, line(&rfq, 0, "1", 1), None, &calc(), &[]).unwrap();
            assert!(matches!(
                q.add_item(&rfq, line(&rfq, 0, "2", 1), None, &calc(), &[]),
                Err(DomainError::Validation(_))
            ));
        }

        #[test]
        fn product_must_match_supplier_and_category() {
            let rfq = published_rfq();
            let mut q = draft_for(&rfq);
            let wrong_category = Product::new("p1", "s1", CategoryId::new("pens"), "Pen");
            let spec = line(&rfq, 0, "1", 1).with_product("p1");
            assert!(matches!(
                q.add_item(&rfq, spec.clone(), Some(&wrong_category), &calc(), &[]),
                Err(DomainError::Validation(_))
            ));
            let other_supplier = Product::new("p1", "s2", CategoryId::new("paper"), "Paper");
            assert!(q.add_item(&rfq, spec.clone(), Some(&other_supplier), &calc(), &[]).is_err());
            assert!(matches!(
                q.add_item(&rfq, spec.clone(), None, &calc(), &[]),
                Err(DomainError::NotFound { .. })
            ));
            let ok = Product::new("p1", "s1", CategoryId::new("paper"), "Paper");
            q.add_item(&rfq, spec, Some(&ok), &calc(), &[]).unwrap();
        }

        #[test]
        fn apply_discount_reprices() {
            let rfq = published_rfq();
            let mut q = draft_for(&rfq);
            let id = q.add_item(&rfq, line(&rfq, 0, "10", 10), None, &calc(), &[]).unwrap();
            let d = ItemDiscount::percentage(Decimal::new(20, 0)).unwrap();
            q.apply_discount(id, Some(d), &calc(), &[]).unwrap();
            assert_eq!(q.grand_total(), price("80"));
            q.apply_discount(id, None, &calc(), &[]).unwrap();
            assert_eq!(q.grand_total(), price("100"));
        }

        #[test]
        fn oversize_amount_discount_leaves_line_untouched() {
            let rfq = published_rfq();
            let mut q = draft_for(&rfq);
            let id = q.add_item(&rfq, line(&rfq, 0, "1", 10), None, &calc(), &[]).unwrap();
            let d = ItemDiscount::amount(price("11")).unwrap();
            assert!(q.apply_discount(id, Some(d), &calc(), &[]).is_err());
            assert!(q.items()[0].discount().is_none());
        }

        #[test]
        fn update_and_remove() {
            let rfq = published_rfq();
            let mut q = draft_for(&rfq);
            let id = q.add_item(&rfq, line(&rfq, 0, "1", 1), None, &calc(), &[]).unwrap();
            q.update_item(id, &rfq, line(&rfq, 1, "2", 5), None, &calc(), &[]).unwrap();
            assert_eq!(q.grand_total(), price("10"));
            q.remove_item(id, &calc()).unwrap();
            assert_eq!(q.grand_total(), Price::ZERO);
            assert!(matches!(
                q.remove_item(id, &calc()),
                Err(DomainError::NotFound { .. })
            ));
        }
    }

    mod lifecycle {
        use super::*;

        fn submitted(rfq: &Rfq) -> Quotation {
            let mut q = draft_for(rfq);
            q.add_item(rfq, line(rfq, 0, "10", 10), None, &calc(), &[]).unwrap();
            q.submit(rfq, &calc(), &HashMap::new()).unwrap();
            q
        }

        #[test]
        fn submit_requires_items() {
            let rfq = published_rfq();
            let mut q = draft_for(&rfq);
            assert!(matches!(
                q.submit(&rfq, &calc(), &HashMap::new()),
                Err(DomainError::InvalidState(_))
            ));
        }

        #[test]
        fn second_submit_is_state_error() {
            let rfq = published_rfq();
            let mut q = submitted(&rfq);
            assert!(q.submitted_at().is_some());
            assert!(
                q.submit(&rfq, &calc(), &HashMap::new())
                    .unwrap_err()
                    .is_state_error()
            );
        }

        #[test]
        fn submit_uses_fresh_tiers() {
            let rfq = published_rfq();
            let product = Product::new("p1", "s1", CategoryId::new("paper"), "Paper");
            let mut q = draft_for(&rfq);
            let spec = line(&rfq, 0, "10", 10).with_product("p1");
            q.add_item(&rfq, spec, Some(&product), &calc(), &[]).unwrap();
            assert_eq!(q.grand_total(), price("100"));

            let tier = ProductDiscount::new(
                "t1",
                "p1",
                DiscountKind::Percentage,
                Decimal::new(10, 0),
                Decimal::ONE,
            )
            .unwrap();
            let snapshot = HashMap::from([(ProductId::new("p1"), vec![tier])]);
            q.submit(&rfq, &calc(), &snapshot).unwrap();
            assert_eq!(q.grand_total(), price("90"));
            assert_eq!(q.items()[0].applied_discount_id(), Some(&"t1".into()));
        }

        #[test]
        fn tiers_of_other_products_are_ignored() {
            let rfq = published_rfq();
            let product = Product::new("p1", "s1", CategoryId::new("paper"), "Paper");
            let foreign = ProductDiscount::new(
                "t-other",
                "p2",
                DiscountKind::Percentage,
                Decimal::new(50, 0),
                Decimal::ONE,
            )
            .unwrap();

            let mut q = draft_for(&rfq);
            let spec = line(&rfq, 0, "10", 10).with_product("p1");
            q.add_item(&rfq, spec, Some(&product), &calc(), std::slice::from_ref(&foreign))
                .unwrap();
            assert_eq!(q.grand_total(), price("100"));
            assert_eq!(q.items()[0].applied_discount_id(), None);

            let mut plain = draft_for(&rfq);
            plain
                .add_item(&rfq, line(&rfq, 0, "10", 10), None, &calc(), &[foreign])
                .unwrap();
            assert_eq!(plain.grand_total(), price("100"));
        }

        #[test]
        fn submit_after_rfq_closed_fails() {
            let mut rfq = published_rfq();
            let mut q = draft_for(&rfq);
            q.add_item(&rfq, line(&rfq, 0, "1", 1), None, &calc(), &[]).unwrap();
            rfq.close().unwrap();
            assert!(matches!(
                q.submit(&rfq, &calc(), &HashMap::new()),
                Err(DomainError::InvalidState(_))
            ));
        }

        #[test]
        fn drafts_cannot_be_edited_after_submit() {
            let rfq = published_rfq();
            let mut q = submitted(&rfq);
            assert!(matches!(
                q.add_item(&rfq, line(&rfq, 1, "1", 1), None, &calc(), &[]),
                Err(DomainError::InvalidState(_))
            ));
        }

        #[test]
        fn accept_from_both_reviewable_states() {
            let rfq = published_rfq();
            let mut q = submitted(&rfq);
            q.accept(&rfq).unwrap();
            assert_eq!(q.status(), QuotationStatus::Accepted);

            let mut q = submitted(&rfq);
            q.begin_review().unwrap();
            assert!(q.reviewed_at().is_some());
            q.accept(&rfq).unwrap();
            assert!(q.decided_at().is_some());
        }

        #[test]
        fn accept_draft_is_invalid_state() {
            let rfq = published_rfq();
            let mut q = draft_for(&rfq);
            assert!(matches!(q.accept(&rfq), Err(DomainError::InvalidState(_))));
        }

        #[test]
        fn accept_on_cancelled_rfq_fails() {
            let mut rfq = published_rfq();
            let mut q = submitted(&rfq);
            rfq.cancel().unwrap();
            assert!(matches!(q.accept(&rfq), Err(DomainError::InvalidState(_))));
        }

        #[test]
        fn accept_on_closed_rfq_succeeds() {
            let mut rfq = published_rfq();
            let mut q = submitted(&rfq);
            rfq.close().unwrap();
            q.accept(&rfq).unwrap();
        }

        #[test]
        fn reject_records_reason() {
            let rfq = published_rfq();
            let mut q = submitted(&rfq);
            assert!(q.reject("  ").is_err());
            q.reject("too expensive").unwrap();
            assert_eq!(q.rejection_reason(), Some("too expensive"));
            assert!(q.reject("again").is_err());
        }

        #[test]
        fn accepted_cannot_be_deleted() {
            let rfq = published_rfq();
            let mut q = submitted(&rfq);
            q.accept(&rfq).unwrap();
            assert!(matches!(q.ensure_deletable(), Err(DomainError::Conflict(_))));
        }
    }

    mod versions {
        use super::*;

        #[test]
        fn revision_copies_items_as_new_draft() {
            let rfq = published_rfq();
            let mut q = draft_for(&rfq);
            q.add_item(&rfq, line(&rfq, 0, "3", 3), None, &calc(), &[]).unwrap();
            q.submit(&rfq, &calc(), &HashMap::new()).unwrap();

            let next = q.revision(2, q.id());
            assert_eq!(next.version_number(), 2);
            assert!(next.is_current());
            assert_eq!(next.previous_version_id(), Some(q.id()));
            assert_eq!(next.status(), QuotationStatus::Draft);
            assert_eq!(next.items().len(), 1);
            assert_ne!(next.items()[0].id(), q.items()[0].id());
            assert_eq!(next.grand_total(), q.grand_total());
        }

        #[test]
        fn next_version_number_is_max_plus_one() {
            let rfq = published_rfq();
            let first = draft_for(&rfq);
            let third = first.revision(3, first.id());
            assert_eq!(Quotation::next_version_number(&[first, third]).unwrap(), 4);
            assert_eq!(Quotation::next_version_number(&[]).unwrap(), 1);
        }

        #[test]
        fn current_flag_toggles() {
            let rfq = published_rfq();
            let mut q = draft_for(&rfq);
            q.mark_superseded();
            assert!(!q.is_current());
            q.mark_current();
            assert!(q.is_current());
        }
    }
}
