//! # Quotation Events

use crate::domain::events::domain_event::{DomainEvent, EventMetadata, EventType};
use crate::domain::value_objects::timestamp::Timestamp;
use crate::domain::value_objects::{
    EventId, PaymentId, Price, QuotationId, QuotationItemId, RfqId, SupplierId,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What happened to a quotation row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuotationChange {
    /// First version of a chain was created.
    Created {
        /// Answered RFQ.
        rfq_id: RfqId,
        /// Quoting supplier.
        supplier_id: SupplierId,
    },
    /// A line was added, replaced, removed or re-discounted.
    ItemsChanged {
        /// Affected line.
        item_id: QuotationItemId,
        /// Draft total after the change.
        preview_total: Price,
    },
    /// The quotation was submitted.
    Submitted {
        /// Frozen grand total.
        grand_total: Price,
    },
    /// The company started reviewing.
    ReviewStarted,
    /// The quotation was accepted and a payment opened.
    Accepted {
        /// Payment created with the acceptance.
        payment_id: PaymentId,
        /// Amount due.
        amount: Price,
    },
    /// The quotation was rejected.
    Rejected {
        /// Company's reason.
        reason: String,
    },
    /// A new version was created from this chain.
    Revised {
        /// Row that stopped being current.
        previous_id: QuotationId,
        /// Version number of the new row.
        version_number: u32,
    },
    /// The row was hard-deleted.
    Deleted {
        /// Row promoted to current, if the deleted row was current.
        promoted_id: Option<QuotationId>,
    },
}

impl QuotationChange {
    fn name(&self) -> &'static str {
        match self {
            Self::Created { .. } => "QuotationCreated",
            Self::ItemsChanged { .. } => "QuotationItemsChanged",
            Self::Submitted { .. } => "QuotationSubmitted",
            Self::ReviewStarted => "QuotationReviewStarted",
            Self::Accepted { .. } => "QuotationAccepted",
            Self::Rejected { .. } => "QuotationRejected",
            Self::Revised { .. } => "QuotationRevised",
            Self::Deleted { .. } => "QuotationDeleted",
        }
    }
}

/// Event emitted after a quotation change is committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotationEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// The change.
    pub change: QuotationChange,
}

impl QuotationEvent {
    /// Creates an event for `quotation_id`.
    #[must_use]
    pub fn new(quotation_id: QuotationId, change: QuotationChange) -> Self {
        Self {
            metadata: EventMetadata::new(*quotation_id.as_uuid()),
            change,
        }
    }

    /// Returns the quotation this event relates to.
    #[must_use]
    pub fn quotation_id(&self) -> QuotationId {
        QuotationId::from_uuid(self.metadata.aggregate_id)
    }
}

impl DomainEvent for QuotationEvent {
    fn event_id(&self) -> EventId {
        self.metadata.event_id
    }

    fn aggregate_id(&self) -> Uuid {
        self.metadata.aggregate_id
    }

    fn timestamp(&self) -> Timestamp {
        self.metadata.timestamp
    }

    fn event_type(&self) -> EventType {
        EventType::Quotation
    }

    fn event_name(&self) -> &'static str {
        self.change.name()
    }
}
