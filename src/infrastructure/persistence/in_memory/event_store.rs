//! # In-Memory Event Store
//!
//! [`EventStore`] keeping one stream per aggregate in a `DashMap`.

use crate::domain::events::{DomainEvent, ProcurementEvent};
use crate::domain::value_objects::timestamp::Timestamp;
use crate::infrastructure::persistence::event_store::{
    EventStore, EventStoreResult, StoredEvent,
};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

/// In-memory implementation of [`EventStore`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventStore {
    streams: Arc<DashMap<Uuid, Vec<StoredEvent>>>,
}

impl InMemoryEventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, event: &ProcurementEvent) -> EventStoreResult<()> {
        let mut stream = self.streams.entry(event.aggregate_id()).or_default();
        let sequence = stream.len() as u64 + 1;
        stream.push(StoredEvent::from_event(event, sequence)?);
        Ok(())
    }

    async fn events_for(&self, aggregate_id: Uuid) -> EventStoreResult<Vec<StoredEvent>> {
        Ok(self
            .streams
            .get(&aggregate_id)
            .map(|s| s.value().clone())
            .unwrap_or_default())
    }

    async fn events_since(&self, since: Timestamp) -> EventStoreResult<Vec<StoredEvent>> {
        let mut events: Vec<StoredEvent> = self
            .streams
            .iter()
            .flat_map(|s| {
                s.value()
                    .iter()
                    .filter(|e| e.timestamp > since)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect();
        events.sort_by_key(|e| (e.timestamp, e.sequence));
        Ok(events)
    }

    async fn count(&self) -> EventStoreResult<u64> {
        Ok(self.streams.iter().map(|s| s.value().len() as u64).sum())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::events::{RfqChange, RfqEvent};
    use crate::domain::value_objects::RfqId;

    #[tokio::test]
    async fn sequences_are_per_aggregate() {
        let store = InMemoryEventStore::new();
        let a = RfqId::new_v4();
        let b = RfqId::new_v4();
        store.append(&RfqEvent::new(a, RfqChange::Closed).into()).await.unwrap();
        store.append(&RfqEvent::new(a, RfqChange::Cancelled).into()).await.unwrap();
        store.append(&RfqEvent::new(b, RfqChange::Closed).into()).await.unwrap();

        let stream = store.events_for(*a.as_uuid()).await.unwrap();
        assert_eq!(stream.iter().map(|e| e.sequence).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(stream[1].event_name, "RfqCancelled");
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn events_since_filters_strictly() {
        let store = InMemoryEventStore::new();
        let before = Timestamp::now().sub_secs(1);
        store
            .append(&RfqEvent::new(RfqId::new_v4(), RfqChange::Closed).into())
            .await
            .unwrap();
        assert_eq!(store.events_since(before).await.unwrap().len(), 1);
        assert!(store.events_since(Timestamp::now().add_secs(5)).await.unwrap().is_empty());
    }
}
