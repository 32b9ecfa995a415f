//! # PostgreSQL Event Store
//!
//! PostgreSQL implementation of [`EventStore`] using sqlx.
//!
//! Append-only storage with JSONB payloads. The per-aggregate sequence is
//! assigned inside the insert; `(aggregate_id, sequence)` is unique.

use crate::domain::events::{EventType, ProcurementEvent};
use crate::domain::value_objects::EventId;
use crate::domain::value_objects::timestamp::Timestamp;
use crate::infrastructure::persistence::event_store::{
    EventStore, EventStoreError, EventStoreResult, StoredEvent,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL implementation of [`EventStore`].
///
/// # Examples
///
/// ```ignore
/// use sqlx::PgPool;
/// use procurement_engine::infrastructure::persistence::postgres::PostgresEventStore;
///
/// let pool = PgPool::connect("postgres://...").await?;
/// let store = PostgresEventStore::new(pool);
/// ```
#[derive(Debug, Clone)]
pub struct PostgresEventStore {
    pool: PgPool,
}

impl PostgresEventStore {
    /// Creates a new PostgreSQL event store.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, sql: &str, bind: EventQuery) -> EventStoreResult<Vec<StoredEvent>> {
        let query = sqlx::query_as::<_, EventRow>(sql);
        let query = match bind {
            EventQuery::Aggregate(id) => query.bind(id),
            EventQuery::Since(since) => query.bind(since),
        };
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| EventStoreError::query(e.to_string()))?;
        rows.into_iter().map(EventRow::try_into_stored_event).collect()
    }
}

enum EventQuery {
    Aggregate(Uuid),
    Since(DateTime<Utc>),
}

#[async_trait]
impl EventStore for PostgresEventStore {
    async fn append(&self, event: &ProcurementEvent) -> EventStoreResult<()> {
        let stored = StoredEvent::from_event(event, 0)?;

        sqlx::query(
            r#"
            INSERT INTO domain_events (
                event_id, aggregate_id, event_type, event_name,
                occurred_at, payload, sequence
            )
            SELECT $1, $2, $3, $4, $5, $6, COALESCE(MAX(sequence), 0) + 1
            FROM domain_events
            WHERE aggregate_id = $2
            "#,
        )
        .bind(stored.event_id.as_uuid())
        .bind(stored.aggregate_id)
        .bind(stored.event_type.to_string())
        .bind(&stored.event_name)
        .bind(stored.timestamp.as_datetime())
        .bind(&stored.payload)
        .execute(&self.pool)
        .await
        .map_err(|e| EventStoreError::query(e.to_string()))?;

        Ok(())
    }

    async fn events_for(&self, aggregate_id: Uuid) -> EventStoreResult<Vec<StoredEvent>> {
        self.fetch(
            r#"
            SELECT event_id, aggregate_id, event_type, event_name,
                   occurred_at, payload, sequence
            FROM domain_events
            WHERE aggregate_id = $1
            ORDER BY sequence ASC
            "#,
            EventQuery::Aggregate(aggregate_id),
        )
        .await
    }

    async fn events_since(&self, since: Timestamp) -> EventStoreResult<Vec<StoredEvent>> {
        self.fetch(
            r#"
            SELECT event_id, aggregate_id, event_type, event_name,
                   occurred_at, payload, sequence
            FROM domain_events
            WHERE occurred_at > $1
            ORDER BY occurred_at ASC, sequence ASC
            "#,
            EventQuery::Since(since.into()),
        )
        .await
    }

    async fn count(&self) -> EventStoreResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM domain_events")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| EventStoreError::query(e.to_string()))?;

        Ok(u64::try_from(count).unwrap_or_default())
    }
}

/// Row type for event queries.
#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    event_id: Uuid,
    aggregate_id: Uuid,
    event_type: String,
    event_name: String,
    occurred_at: DateTime<Utc>,
    payload: serde_json::Value,
    sequence: i64,
}

impl EventRow {
    fn try_into_stored_event(self) -> EventStoreResult<StoredEvent> {
        let event_type: EventType = serde_json::from_value(serde_json::Value::String(self.event_type))
            .map_err(|e| EventStoreError::deserialization(e.to_string()))?;
        let sequence = u64::try_from(self.sequence)
            .map_err(|e| EventStoreError::deserialization(e.to_string()))?;

        Ok(StoredEvent {
            event_id: EventId::from_uuid(self.event_id),
            aggregate_id: self.aggregate_id,
            event_type,
            event_name: self.event_name,
            timestamp: self.occurred_at.into(),
            payload: self.payload,
            sequence,
        })
    }
}
