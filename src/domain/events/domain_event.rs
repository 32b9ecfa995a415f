//! # Domain Event Trait
//!
//! Base trait for all domain events, along with common event metadata.
//!
//! Concrete events live in [`rfq_events`](super::rfq_events),
//! [`quotation_events`](super::quotation_events) and
//! [`payment_events`](super::payment_events).

use crate::domain::value_objects::EventId;
use crate::domain::value_objects::timestamp::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Type of domain event, by aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// RFQ lifecycle events.
    Rfq,
    /// Quotation lifecycle events.
    Quotation,
    /// Payment lifecycle events.
    Payment,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rfq => write!(f, "RFQ"),
            Self::Quotation => write!(f, "QUOTATION"),
            Self::Payment => write!(f, "PAYMENT"),
        }
    }
}

/// Trait for all domain events.
///
/// Domain events are immutable records of a committed state change.
///
/// # Required Methods
///
/// - [`event_id`](DomainEvent::event_id) - Unique identifier for this event
/// - [`aggregate_id`](DomainEvent::aggregate_id) - UUID of the changed aggregate
/// - [`timestamp`](DomainEvent::timestamp) - When the event occurred
/// - [`event_type`](DomainEvent::event_type) - Aggregate category
/// - [`event_name`](DomainEvent::event_name) - Human-readable event name
pub trait DomainEvent: Send + Sync + fmt::Debug {
    /// Returns the unique identifier for this event.
    fn event_id(&self) -> EventId;

    /// Returns the UUID of the aggregate this event relates to.
    fn aggregate_id(&self) -> Uuid;

    /// Returns when this event occurred.
    fn timestamp(&self) -> Timestamp;

    /// Returns the type/category of this event.
    fn event_type(&self) -> EventType;

    /// Returns the human-readable name of this event.
    fn event_name(&self) -> &'static str;
}

/// Common metadata for all domain events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique identifier for this event.
    pub event_id: EventId,
    /// The aggregate this event relates to.
    pub aggregate_id: Uuid,
    /// When this event occurred.
    pub timestamp: Timestamp,
}

impl EventMetadata {
    /// Creates metadata with a generated event ID, stamped now.
    #[must_use]
    pub fn new(aggregate_id: Uuid) -> Self {
        Self {
            event_id: EventId::new_v4(),
            aggregate_id,
            timestamp: Timestamp::now(),
        }
    }

    /// Creates event metadata with specific values (for reconstruction).
    #[must_use]
    pub fn from_parts(event_id: EventId, aggregate_id: Uuid, timestamp: Timestamp) -> Self {
        Self {
            event_id,
            aggregate_id,
            timestamp,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn event_type_display() {
        assert_eq!(EventType::Rfq.to_string(), "RFQ");
        assert_eq!(EventType::Quotation.to_string(), "QUOTATION");
        assert_eq!(EventType::Payment.to_string(), "PAYMENT");
    }

    #[test]
    fn metadata_ids_are_unique() {
        let id = Uuid::new_v4();
        assert_ne!(EventMetadata::new(id).event_id, EventMetadata::new(id).event_id);
    }

    #[test]
    fn metadata_serde_roundtrip() {
        let metadata = EventMetadata::new(Uuid::new_v4());
        let json = serde_json::to_string(&metadata).unwrap();
        let back: EventMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(metadata, back);
    }
}
