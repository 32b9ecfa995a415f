//! # Event Store
//!
//! Append-only storage port for domain events.
//!
//! Events are appended after the state change they describe has been
//! committed. A failed append is reported to the caller but never undoes
//! the committed write.

use crate::domain::events::{DomainEvent, EventType, ProcurementEvent};
use crate::domain::value_objects::EventId;
use crate::domain::value_objects::timestamp::Timestamp;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Error type for event store operations.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// Event payload could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Stored row could not be decoded.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Query failed.
    #[error("query error: {0}")]
    Query(String),
}

impl EventStoreError {
    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Creates a deserialization error.
    #[must_use]
    pub fn deserialization(msg: impl Into<String>) -> Self {
        Self::Deserialization(msg.into())
    }

    /// Creates a query error.
    #[must_use]
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }
}

/// Result type for event store operations.
pub type EventStoreResult<T> = Result<T, EventStoreError>;

/// An event as persisted, with its JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    /// Event identifier.
    pub event_id: EventId,
    /// Aggregate the event relates to.
    pub aggregate_id: Uuid,
    /// Aggregate category.
    pub event_type: EventType,
    /// Event name, e.g. `QuotationSubmitted`.
    pub event_name: String,
    /// When the event occurred.
    pub timestamp: Timestamp,
    /// Full event as JSON.
    pub payload: serde_json::Value,
    /// Position within the aggregate's stream, starting at 1.
    pub sequence: u64,
}

impl StoredEvent {
    /// Encodes a domain event for storage at `sequence`.
    ///
    /// # Errors
    ///
    /// Returns `EventStoreError::Serialization` if encoding fails.
    pub fn from_event(event: &ProcurementEvent, sequence: u64) -> EventStoreResult<Self> {
        let payload = serde_json::to_value(event)
            .map_err(|e| EventStoreError::serialization(e.to_string()))?;
        Ok(Self {
            event_id: event.event_id(),
            aggregate_id: event.aggregate_id(),
            event_type: event.event_type(),
            event_name: event.event_name().to_string(),
            timestamp: event.timestamp(),
            payload,
            sequence,
        })
    }

    /// Decodes the payload back into a domain event.
    ///
    /// # Errors
    ///
    /// Returns `EventStoreError::Deserialization` if the payload is malformed.
    pub fn to_event(&self) -> EventStoreResult<ProcurementEvent> {
        serde_json::from_value(self.payload.clone())
            .map_err(|e| EventStoreError::deserialization(e.to_string()))
    }
}

/// Append-only event storage.
#[async_trait]
pub trait EventStore: Send + Sync + fmt::Debug {
    /// Appends an event to its aggregate's stream.
    async fn append(&self, event: &ProcurementEvent) -> EventStoreResult<()>;

    /// Returns an aggregate's events in sequence order.
    async fn events_for(&self, aggregate_id: Uuid) -> EventStoreResult<Vec<StoredEvent>>;

    /// Returns events strictly after `since`, oldest first.
    async fn events_since(&self, since: Timestamp) -> EventStoreResult<Vec<StoredEvent>>;

    /// Counts all stored events.
    async fn count(&self) -> EventStoreResult<u64>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::events::{RfqChange, RfqEvent};
    use crate::domain::value_objects::RfqId;

    #[test]
    fn stored_event_roundtrip() {
        let event: ProcurementEvent = RfqEvent::new(RfqId::new_v4(), RfqChange::Closed).into();
        let stored = StoredEvent::from_event(&event, 3).unwrap();
        assert_eq!(stored.event_name, "RfqClosed");
        assert_eq!(stored.sequence, 3);
        assert_eq!(stored.to_event().unwrap(), event);
    }
}
