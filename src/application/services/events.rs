//! # Event Publisher
//!
//! Appends domain events after their state change has been committed.
//! A failed append is logged and swallowed: the committed write stands.

use crate::domain::events::{DomainEvent, ProcurementEvent};
use crate::infrastructure::persistence::EventStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Fire-and-log wrapper around an [`EventStore`].
#[derive(Debug, Clone)]
pub struct EventPublisher {
    store: Arc<dyn EventStore>,
}

impl EventPublisher {
    /// Creates a publisher appending to `store`.
    #[must_use]
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn EventStore> {
        &self.store
    }

    /// Appends `event`, logging instead of failing.
    pub async fn publish(&self, event: impl Into<ProcurementEvent>) {
        let event = event.into();
        match self.store.append(&event).await {
            Ok(()) => debug!(
                event = event.event_name(),
                aggregate_id = %event.aggregate_id(),
                "event appended"
            ),
            Err(err) => warn!(
                event = event.event_name(),
                aggregate_id = %event.aggregate_id(),
                error = %err,
                "failed to append event"
            ),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::events::{RfqChange, RfqEvent};
    use crate::domain::value_objects::RfqId;
    use crate::domain::value_objects::timestamp::Timestamp;
    use crate::infrastructure::persistence::event_store::{
        EventStoreError, EventStoreResult, StoredEvent,
    };
    use crate::infrastructure::persistence::in_memory::InMemoryEventStore;
    use async_trait::async_trait;
    use uuid::Uuid;

    #[derive(Debug)]
    struct BrokenStore;

    #[async_trait]
    impl EventStore for BrokenStore {
        async fn append(&self, _event: &ProcurementEvent) -> EventStoreResult<()> {
            Err(EventStoreError::query("disk full"))
        }

        async fn events_for(&self, _aggregate_id: Uuid) -> EventStoreResult<Vec<StoredEvent>> {
            Ok(Vec::new())
        }

        async fn events_since(&self, _since: Timestamp) -> EventStoreResult<Vec<StoredEvent>> {
            Ok(Vec::new())
        }

        async fn count(&self) -> EventStoreResult<u64> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn publishes_to_store() {
        let store = Arc::new(InMemoryEventStore::new());
        let publisher = EventPublisher::new(store.clone());
        publisher.publish(RfqEvent::new(RfqId::new_v4(), RfqChange::Closed)).await;
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn append_failure_is_swallowed() {
        let publisher = EventPublisher::new(Arc::new(BrokenStore));
        publisher.publish(RfqEvent::new(RfqId::new_v4(), RfqChange::Closed)).await;
    }
}
