//! # RFQ Aggregate Root
//!
//! The RFQ (Request-for-Quotation) aggregate is the document a company
//! publishes to collect quotations from suppliers.
//!
//! It owns its line items and supplier invitations. Items may only change
//! while the RFQ is a draft; invitations only make sense for
//! [`RfqType::Invited`] documents.
//!
//! # State Machine
//!
//! ```text
//! Draft → Published → Closed
//!   ↓         ↓
//!   └─────────┴→ Cancelled
//! ```
//!
//! # Examples
//!
//! ```
//! use procurement_engine::domain::entities::rfq::{Rfq, RfqItemSpec};
//! use procurement_engine::domain::value_objects::{CompanyId, Quantity, RfqStatus, RfqType};
//!
//! let mut rfq = Rfq::builder(CompanyId::new("acme"), "Office supplies")
//!     .rfq_type(RfqType::Open)
//!     .build()
//!     .unwrap();
//!
//! rfq.add_item(RfqItemSpec::new("paper", Quantity::from_units(10).unwrap(), "box")).unwrap();
//! rfq.publish().unwrap();
//! assert_eq!(rfq.status(), RfqStatus::Published);
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::timestamp::Timestamp;
use crate::domain::value_objects::{
    CategoryId, CompanyId, InvitationId, InvitationStatus, Price, Quantity, RfqId, RfqItemId,
    RfqStatus, RfqType, SupplierId,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Caller-supplied contents of an RFQ line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RfqItemSpec {
    /// Category the requested goods belong to.
    pub category_id: CategoryId,
    /// Requested quantity.
    pub quantity: Quantity,
    /// Unit of measure, e.g. `box` or `kg`.
    pub unit_of_measure: String,
    /// Price the company hopes to pay per unit.
    pub target_price: Option<Price>,
    /// Free-text specification.
    pub specification: String,
}

impl RfqItemSpec {
    /// Creates an item spec without target price or specification text.
    #[must_use]
    pub fn new(
        category_id: impl Into<CategoryId>,
        quantity: Quantity,
        unit_of_measure: impl Into<String>,
    ) -> Self {
        Self {
            category_id: category_id.into(),
            quantity,
            unit_of_measure: unit_of_measure.into(),
            target_price: None,
            specification: String::new(),
        }
    }

    /// Sets the target unit price.
    #[must_use]
    pub fn with_target_price(mut self, price: Price) -> Self {
        self.target_price = Some(price);
        self
    }

    /// Sets the specification text.
    #[must_use]
    pub fn with_specification(mut self, text: impl Into<String>) -> Self {
        self.specification = text.into();
        self
    }

    fn validate(&self) -> DomainResult<()> {
        if self.unit_of_measure.trim().is_empty() {
            return Err(DomainError::validation("unit of measure must not be empty"));
        }
        Ok(())
    }
}

/// A line item on an RFQ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RfqItem {
    id: RfqItemId,
    category_id: CategoryId,
    quantity: Quantity,
    unit_of_measure: String,
    target_price: Option<Price>,
    specification: String,
}

impl RfqItem {
    fn from_spec(id: RfqItemId, spec: RfqItemSpec) -> Self {
        Self {
            id,
            category_id: spec.category_id,
            quantity: spec.quantity,
            unit_of_measure: spec.unit_of_measure,
            target_price: spec.target_price,
            specification: spec.specification,
        }
    }

    /// Returns the item ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> RfqItemId {
        self.id
    }

    /// Returns the requested category.
    #[inline]
    #[must_use]
    pub fn category_id(&self) -> &CategoryId {
        &self.category_id
    }

    /// Returns the requested quantity.
    #[inline]
    #[must_use]
    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Returns the unit of measure.
    #[inline]
    #[must_use]
    pub fn unit_of_measure(&self) -> &str {
        &self.unit_of_measure
    }

    /// Returns the target unit price, if set.
    #[inline]
    #[must_use]
    pub fn target_price(&self) -> Option<Price> {
        self.target_price
    }

    /// Returns the specification text.
    #[inline]
    #[must_use]
    pub fn specification(&self) -> &str {
        &self.specification
    }
}

/// A supplier invitation on an invited RFQ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RfqInvitation {
    id: InvitationId,
    supplier_id: SupplierId,
    status: InvitationStatus,
    invited_at: Timestamp,
    revoked_at: Option<Timestamp>,
}

impl RfqInvitation {
    fn new(supplier_id: SupplierId, at: Timestamp) -> Self {
        Self {
            id: InvitationId::new_v4(),
            supplier_id,
            status: InvitationStatus::Pending,
            invited_at: at,
            revoked_at: None,
        }
    }

    /// Returns the invitation ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> InvitationId {
        self.id
    }

    /// Returns the invited supplier.
    #[inline]
    #[must_use]
    pub fn supplier_id(&self) -> &SupplierId {
        &self.supplier_id
    }

    /// Returns the invitation status.
    #[inline]
    #[must_use]
    pub fn status(&self) -> InvitationStatus {
        self.status
    }

    /// Returns when the supplier was invited.
    #[inline]
    #[must_use]
    pub fn invited_at(&self) -> Timestamp {
        self.invited_at
    }

    /// Returns when the invitation was revoked, if it was.
    #[inline]
    #[must_use]
    pub fn revoked_at(&self) -> Option<Timestamp> {
        self.revoked_at
    }

    /// Returns true if the invitation still grants access.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// RFQ aggregate root.
///
/// # Invariants
///
/// - Items change only while [`RfqStatus::Draft`]
/// - Publishing requires at least one item
/// - At most one active invitation per supplier
/// - Status changes follow [`RfqStatus::can_transition_to`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rfq {
    id: RfqId,
    company_id: CompanyId,
    title: String,
    description: String,
    deadline: Option<Timestamp>,
    rfq_type: RfqType,
    status: RfqStatus,
    items: Vec<RfqItem>,
    invitations: Vec<RfqInvitation>,
    /// Version for optimistic locking.
    version: u64,
    created_at: Timestamp,
    updated_at: Timestamp,
    published_at: Option<Timestamp>,
    closed_at: Option<Timestamp>,
    cancelled_at: Option<Timestamp>,
}

impl Rfq {
    /// Creates a draft RFQ.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the title is blank or the
    /// deadline is already in the past.
    pub fn new(
        company_id: CompanyId,
        title: impl Into<String>,
        description: impl Into<String>,
        rfq_type: RfqType,
        deadline: Option<Timestamp>,
    ) -> DomainResult<Self> {
        let title = title.into();
        Self::validate_title(&title)?;
        Self::validate_deadline(deadline)?;

        let now = Timestamp::now();
        Ok(Self {
            id: RfqId::new_v4(),
            company_id,
            title,
            description: description.into(),
            deadline,
            rfq_type,
            status: RfqStatus::Draft,
            items: Vec::new(),
            invitations: Vec::new(),
            version: 1,
            created_at: now,
            updated_at: now,
            published_at: None,
            closed_at: None,
            cancelled_at: None,
        })
    }

    /// Returns a builder for constructing an RFQ.
    #[must_use]
    pub fn builder(company_id: CompanyId, title: impl Into<String>) -> RfqBuilder {
        RfqBuilder::new(company_id, title)
    }

    fn validate_title(title: &str) -> DomainResult<()> {
        if title.trim().is_empty() {
            return Err(DomainError::validation("title must not be empty"));
        }
        Ok(())
    }

    fn validate_deadline(deadline: Option<Timestamp>) -> DomainResult<()> {
        if deadline.is_some_and(|d| d.is_expired()) {
            return Err(DomainError::validation("deadline must be in the future"));
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
        self.version = self.version.saturating_add(1);
    }

    fn transition_to(&mut self, target: RfqStatus) -> DomainResult<()> {
        if !self.status.can_transition_to(target) {
            return Err(DomainError::transition("RFQ", self.status, target));
        }
        self.status = target;
        self.touch();
        Ok(())
    }

    fn ensure_editable(&self, action: &str) -> DomainResult<()> {
        if !self.status.is_editable() {
            return Err(DomainError::invalid_state(format!(
                "cannot {action} on RFQ {} in status {}",
                self.id, self.status
            )));
        }
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Returns the RFQ ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> RfqId {
        self.id
    }

    /// Returns the owning company.
    #[inline]
    #[must_use]
    pub fn company_id(&self) -> &CompanyId {
        &self.company_id
    }

    /// Returns the title.
    #[inline]
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description.
    #[inline]
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the response deadline, if any.
    #[inline]
    #[must_use]
    pub fn deadline(&self) -> Option<Timestamp> {
        self.deadline
    }

    /// Returns the audience type.
    #[inline]
    #[must_use]
    pub fn rfq_type(&self) -> RfqType {
        self.rfq_type
    }

    /// Returns the lifecycle status.
    #[inline]
    #[must_use]
    pub fn status(&self) -> RfqStatus {
        self.status
    }

    /// Returns the line items in insertion order.
    #[inline]
    #[must_use]
    pub fn items(&self) -> &[RfqItem] {
        &self.items
    }

    /// Returns a line item by ID.
    #[must_use]
    pub fn item(&self, item_id: RfqItemId) -> Option<&RfqItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    /// Returns all invitations, including revoked ones.
    #[inline]
    #[must_use]
    pub fn invitations(&self) -> &[RfqInvitation] {
        &self.invitations
    }

    /// Returns the version for optimistic locking.
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns when this RFQ was created.
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Returns when this RFQ was last updated.
    #[inline]
    #[must_use]
    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Returns when this RFQ was published.
    #[inline]
    #[must_use]
    pub fn published_at(&self) -> Option<Timestamp> {
        self.published_at
    }

    /// Returns when this RFQ was closed.
    #[inline]
    #[must_use]
    pub fn closed_at(&self) -> Option<Timestamp> {
        self.closed_at
    }

    /// Returns when this RFQ was cancelled.
    #[inline]
    #[must_use]
    pub fn cancelled_at(&self) -> Option<Timestamp> {
        self.cancelled_at
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Returns true if `supplier` holds an active invitation.
    #[must_use]
    pub fn has_active_invitation(&self, supplier: &SupplierId) -> bool {
        self.invitations
            .iter()
            .any(|i| i.is_active() && &i.supplier_id == supplier)
    }

    /// Returns true if `supplier` may see this RFQ and quote against it.
    ///
    /// Open RFQs are visible to every supplier; invited RFQs only to
    /// suppliers with an active invitation.
    #[must_use]
    pub fn is_visible_to(&self, supplier: &SupplierId) -> bool {
        match self.rfq_type {
            RfqType::Open => true,
            RfqType::Invited => self.has_active_invitation(supplier),
        }
    }

    /// Returns true if the deadline has passed at `at`.
    #[must_use]
    pub fn is_past_deadline(&self, at: Timestamp) -> bool {
        self.deadline.is_some_and(|d| at >= d)
    }

    // ========================================================================
    // Details and items
    // ========================================================================

    /// Replaces title, description and deadline.
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidState` unless draft
    /// - `DomainError::Validation` for a blank title or past deadline
    pub fn update_details(
        &mut self,
        title: impl Into<String>,
        description: impl Into<String>,
        deadline: Option<Timestamp>,
    ) -> DomainResult<()> {
        self.ensure_editable("update details")?;
        let title = title.into();
        Self::validate_title(&title)?;
        Self::validate_deadline(deadline)?;
        self.title = title;
        self.description = description.into();
        self.deadline = deadline;
        self.touch();
        Ok(())
    }

    /// Appends a line item and returns its ID.
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidState` unless draft
    /// - `DomainError::Validation` for a blank unit of measure
    pub fn add_item(&mut self, spec: RfqItemSpec) -> DomainResult<RfqItemId> {
        self.ensure_editable("add items")?;
        spec.validate()?;
        let id = RfqItemId::new_v4();
        self.items.push(RfqItem::from_spec(id, spec));
        self.touch();
        Ok(id)
    }

    /// Replaces the contents of a line item, keeping its ID.
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidState` unless draft
    /// - `DomainError::NotFound` for an unknown item
    pub fn update_item(&mut self, item_id: RfqItemId, spec: RfqItemSpec) -> DomainResult<()> {
        self.ensure_editable("update items")?;
        spec.validate()?;
        let slot = self
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| DomainError::not_found("RFQ item", item_id))?;
        *slot = RfqItem::from_spec(item_id, spec);
        self.touch();
        Ok(())
    }

    /// Removes a line item.
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidState` unless draft
    /// - `DomainError::NotFound` for an unknown item
    pub fn remove_item(&mut self, item_id: RfqItemId) -> DomainResult<()> {
        self.ensure_editable("delete items")?;
        let before = self.items.len();
        self.items.retain(|i| i.id != item_id);
        if self.items.len() == before {
            return Err(DomainError::not_found("RFQ item", item_id));
        }
        self.touch();
        Ok(())
    }

    // ========================================================================
    // Invitations
    // ========================================================================

    fn ensure_invitable(&self) -> DomainResult<()> {
        if !self.rfq_type.requires_invitation() {
            return Err(DomainError::invalid_operation(format!(
                "RFQ {} is open to all suppliers; invitations do not apply",
                self.id
            )));
        }
        if self.status.is_terminal() {
            return Err(DomainError::invalid_state(format!(
                "cannot invite suppliers to RFQ {} in status {}",
                self.id, self.status
            )));
        }
        Ok(())
    }

    /// Invites one supplier.
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidOperation` for open RFQs
    /// - `DomainError::InvalidState` once closed or cancelled
    /// - `DomainError::Conflict` if the supplier already holds an active invitation
    pub fn invite(&mut self, supplier: SupplierId) -> DomainResult<InvitationId> {
        let ids = self.invite_all(vec![supplier])?;
        ids.into_iter()
            .next()
            .ok_or_else(|| DomainError::invalid_state("invitation was not recorded"))
    }

    /// Invites several suppliers at once, all or nothing.
    ///
    /// # Errors
    ///
    /// As [`invite`](Self::invite); a supplier listed twice is a conflict.
    /// On error no invitation is added.
    pub fn invite_all(&mut self, suppliers: Vec<SupplierId>) -> DomainResult<Vec<InvitationId>> {
        self.ensure_invitable()?;
        if suppliers.is_empty() {
            return Err(DomainError::validation("no suppliers to invite"));
        }

        let mut seen = HashSet::new();
        for supplier in &suppliers {
            if !seen.insert(supplier) {
                return Err(DomainError::conflict(format!(
                    "supplier {supplier} listed more than once"
                )));
            }
            if self.has_active_invitation(supplier) {
                return Err(DomainError::conflict(format!(
                    "supplier {supplier} is already invited to RFQ {}",
                    self.id
                )));
            }
        }

        let now = Timestamp::now();
        let mut ids = Vec::with_capacity(suppliers.len());
        for supplier in suppliers {
            let invitation = RfqInvitation::new(supplier, now);
            ids.push(invitation.id);
            self.invitations.push(invitation);
        }
        self.touch();
        Ok(ids)
    }

    /// Revokes the supplier's active invitation.
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidOperation` for open RFQs
    /// - `DomainError::InvalidState` once closed or cancelled
    /// - `DomainError::NotFound` if the supplier has no active invitation
    pub fn revoke_invitation(&mut self, supplier: &SupplierId) -> DomainResult<()> {
        self.ensure_invitable()?;
        let invitation = self
            .invitations
            .iter_mut()
            .find(|i| i.is_active() && &i.supplier_id == supplier)
            .ok_or_else(|| DomainError::not_found("invitation", supplier))?;
        invitation.status = InvitationStatus::Revoked;
        invitation.revoked_at = Some(Timestamp::now());
        self.touch();
        Ok(())
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Publishes the RFQ.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidState` unless draft with at least one item.
    pub fn publish(&mut self) -> DomainResult<()> {
        if self.status != RfqStatus::Draft {
            return Err(DomainError::invalid_state(format!(
                "RFQ {} can only be published from DRAFT, current status is {}",
                self.id, self.status
            )));
        }
        if self.items.is_empty() {
            return Err(DomainError::invalid_state(format!(
                "RFQ {} has no items",
                self.id
            )));
        }
        self.transition_to(RfqStatus::Published)?;
        self.published_at = Some(self.updated_at);
        Ok(())
    }

    /// Closes the RFQ to new quotations.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStateTransition` unless published.
    pub fn close(&mut self) -> DomainResult<()> {
        self.transition_to(RfqStatus::Closed)?;
        self.closed_at = Some(self.updated_at);
        Ok(())
    }

    /// Cancels the RFQ.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStateTransition` once closed or cancelled.
    pub fn cancel(&mut self) -> DomainResult<()> {
        self.transition_to(RfqStatus::Cancelled)?;
        self.cancelled_at = Some(self.updated_at);
        Ok(())
    }
}

impl fmt::Display for Rfq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RFQ({} \"{}\" {} {} items [{}])",
            self.id,
            self.title,
            self.rfq_type,
            self.items.len(),
            self.status
        )
    }
}

/// Builder for constructing [`Rfq`] instances.
#[derive(Debug, Clone)]
pub struct RfqBuilder {
    company_id: CompanyId,
    title: String,
    description: String,
    rfq_type: RfqType,
    deadline: Option<Timestamp>,
}

impl RfqBuilder {
    /// Creates a new builder with required fields.
    #[must_use]
    pub fn new(company_id: CompanyId, title: impl Into<String>) -> Self {
        Self {
            company_id,
            title: title.into(),
            description: String::new(),
            rfq_type: RfqType::default(),
            deadline: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the audience type.
    #[must_use]
    pub fn rfq_type(mut self, rfq_type: RfqType) -> Self {
        self.rfq_type = rfq_type;
        self
    }

    /// Sets the response deadline.
    #[must_use]
    pub fn deadline(mut self, deadline: Timestamp) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Builds the RFQ with validation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if validation fails.
    pub fn build(self) -> DomainResult<Rfq> {
        Rfq::new(
            self.company_id,
            self.title,
            self.description,
            self.rfq_type,
            self.deadline,
        )
    }
}
