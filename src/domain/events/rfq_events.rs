//! # RFQ Events
//!
//! ```text
//! Created -> DetailsUpdated* / ItemAdded* / ItemUpdated* / ItemRemoved*
//!         -> Published -> SuppliersInvited* / InvitationRevoked*
//!         -> Closed | Cancelled
//! Deleted (only without quotations)
//! ```

use crate::domain::events::domain_event::{DomainEvent, EventMetadata, EventType};
use crate::domain::value_objects::timestamp::Timestamp;
use crate::domain::value_objects::{CompanyId, EventId, RfqId, RfqItemId, RfqType, SupplierId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What happened to an RFQ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RfqChange {
    /// A draft RFQ was created.
    Created {
        /// Owning company.
        company_id: CompanyId,
        /// Audience type.
        rfq_type: RfqType,
        /// Title at creation.
        title: String,
    },
    /// Title, description or deadline changed.
    DetailsUpdated,
    /// A line item was added.
    ItemAdded {
        /// New item.
        item_id: RfqItemId,
    },
    /// A line item was replaced.
    ItemUpdated {
        /// Changed item.
        item_id: RfqItemId,
    },
    /// A line item was removed.
    ItemRemoved {
        /// Removed item.
        item_id: RfqItemId,
    },
    /// The RFQ was published.
    Published {
        /// Number of items at publication.
        item_count: usize,
    },
    /// Suppliers were invited.
    SuppliersInvited {
        /// Invited suppliers.
        supplier_ids: Vec<SupplierId>,
    },
    /// A supplier's invitation was revoked.
    InvitationRevoked {
        /// Supplier who lost access.
        supplier_id: SupplierId,
    },
    /// The RFQ was closed.
    Closed,
    /// The RFQ was cancelled.
    Cancelled,
    /// The RFQ was hard-deleted.
    Deleted,
}

impl RfqChange {
    fn name(&self) -> &'static str {
        match self {
            Self::Created { .. } => "RfqCreated",
            Self::DetailsUpdated => "RfqDetailsUpdated",
            Self::ItemAdded { .. } => "RfqItemAdded",
            Self::ItemUpdated { .. } => "RfqItemUpdated",
            Self::ItemRemoved { .. } => "RfqItemRemoved",
            Self::Published { .. } => "RfqPublished",
            Self::SuppliersInvited { .. } => "SuppliersInvited",
            Self::InvitationRevoked { .. } => "InvitationRevoked",
            Self::Closed => "RfqClosed",
            Self::Cancelled => "RfqCancelled",
            Self::Deleted => "RfqDeleted",
        }
    }
}

/// Event emitted after an RFQ change is committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RfqEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// The change.
    pub change: RfqChange,
}

impl RfqEvent {
    /// Creates an event for `rfq_id`.
    #[must_use]
    pub fn new(rfq_id: RfqId, change: RfqChange) -> Self {
        Self {
            metadata: EventMetadata::new(*rfq_id.as_uuid()),
            change,
        }
    }

    /// Returns the RFQ this event relates to.
    #[must_use]
    pub fn rfq_id(&self) -> RfqId {
        RfqId::from_uuid(self.metadata.aggregate_id)
    }
}

impl DomainEvent for RfqEvent {
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
        EventType::Rfq
    }

    fn event_name(&self) -> &'static str {
        self.change.name()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn names_and_ids() {
        let rfq_id = RfqId::new_v4();
        let event = RfqEvent::new(rfq_id, RfqChange::Published { item_count: 2 });
        assert_eq!(event.event_name(), "RfqPublished");
        assert_eq!(event.event_type(), EventType::Rfq);
        assert_eq!(event.rfq_id(), rfq_id);
    }

    #[test]
    fn serde_roundtrip() {
        let event = RfqEvent::new(
            RfqId::new_v4(),
            RfqChange::SuppliersInvited {
                supplier_ids: vec![SupplierId::new("s1")],
            },
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["change"]["type"], "suppliers_invited");
        let back: RfqEvent = serde_json::from_value(json).unwrap();
        assert_eq!(event, back);
    }
}
