//! # Domain Events
//!
//! Events emitted after committed state changes, for audit and downstream
//! consumers.
//!
//! - [`RfqEvent`]: RFQ lifecycle, items and invitations
//! - [`QuotationEvent`]: Quotation lifecycle and versioning
//! - [`PaymentEvent`]: Payment lifecycle
//! - [`ProcurementEvent`]: Any of the above, as appended to the event store

pub mod domain_event;
pub mod payment_events;
pub mod quotation_events;
pub mod rfq_events;

pub use domain_event::{DomainEvent, EventMetadata, EventType};
pub use payment_events::{PaymentChange, PaymentEvent};
pub use quotation_events::{QuotationChange, QuotationEvent};
pub use rfq_events::{RfqChange, RfqEvent};

use crate::domain::value_objects::EventId;
use crate::domain::value_objects::timestamp::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Any domain event raised by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "aggregate", rename_all = "snake_case")]
pub enum ProcurementEvent {
    /// RFQ event.
    Rfq(RfqEvent),
    /// Quotation event.
    Quotation(QuotationEvent),
    /// Payment event.
    Payment(PaymentEvent),
}

impl ProcurementEvent {
    fn inner(&self) -> &dyn DomainEvent {
        match self {
            Self::Rfq(e) => e,
            Self::Quotation(e) => e,
            Self::Payment(e) => e,
        }
    }
}

impl DomainEvent for ProcurementEvent {
    fn event_id(&self) -> EventId {
        self.inner().event_id()
    }

    fn aggregate_id(&self) -> Uuid {
        self.inner().aggregate_id()
    }

    fn timestamp(&self) -> Timestamp {
        self.inner().timestamp()
    }

    fn event_type(&self) -> EventType {
        self.inner().event_type()
    }

    fn event_name(&self) -> &'static str {
        self.inner().event_name()
    }
}

impl From<RfqEvent> for ProcurementEvent {
    fn from(event: RfqEvent) -> Self {
        Self::Rfq(event)
    }
}

impl From<QuotationEvent> for ProcurementEvent {
    fn from(event: QuotationEvent) -> Self {
        Self::Quotation(event)
    }
}

impl From<PaymentEvent> for ProcurementEvent {
    fn from(event: PaymentEvent) -> Self {
        Self::Payment(event)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{PaymentId, QuotationId};

    #[test]
    fn wrapper_delegates() {
        let payment_id = PaymentId::new_v4();
        let event: ProcurementEvent = PaymentEvent::new(
            payment_id,
            PaymentChange::Failed {
                reason: "declined".into(),
            },
        )
        .into();
        assert_eq!(event.event_type(), EventType::Payment);
        assert_eq!(event.event_name(), "PaymentFailed");
        assert_eq!(event.aggregate_id(), *payment_id.as_uuid());
    }

    #[test]
    fn wrapper_serde_roundtrip() {
        let event: ProcurementEvent =
            QuotationEvent::new(QuotationId::new_v4(), QuotationChange::ReviewStarted).into();
        let json = serde_json::to_string(&event).unwrap();
        let back: ProcurementEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }
}
