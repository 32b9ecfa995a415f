//! # Payment Events

use crate::domain::events::domain_event::{DomainEvent, EventMetadata, EventType};
use crate::domain::value_objects::timestamp::Timestamp;
use crate::domain::value_objects::{EventId, OrderId, PaymentId, Price};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What happened to a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentChange {
    /// A pending payment was opened.
    Created {
        /// Settled order.
        order_id: OrderId,
        /// Amount due.
        amount: Price,
        /// Currency code.
        currency: String,
    },
    /// Handed to the provider.
    Processing {
        /// Provider reference.
        transaction_id: String,
    },
    /// Settlement confirmed.
    Completed {
        /// Provider reference.
        transaction_id: String,
    },
    /// Settlement failed.
    Failed {
        /// Failure reason.
        reason: String,
    },
    /// Funds returned.
    Refunded {
        /// Refunded amount.
        amount: Price,
        /// Refund reason.
        reason: String,
    },
}

impl PaymentChange {
    fn name(&self) -> &'static str {
        match self {
            Self::Created { .. } => "PaymentCreated",
            Self::Processing { .. } => "PaymentProcessing",
            Self::Completed { .. } => "PaymentCompleted",
            Self::Failed { .. } => "PaymentFailed",
            Self::Refunded { .. } => "PaymentRefunded",
        }
    }
}

/// Event emitted after a payment change is committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// The change.
    pub change: PaymentChange,
}

impl PaymentEvent {
    /// Creates an event for `payment_id`.
    #[must_use]
    pub fn new(payment_id: PaymentId, change: PaymentChange) -> Self {
        Self {
            metadata: EventMetadata::new(*payment_id.as_uuid()),
            change,
        }
    }

    /// Returns the payment this event relates to.
    #[must_use]
    pub fn payment_id(&self) -> PaymentId {
        PaymentId::from_uuid(self.metadata.aggregate_id)
    }
}

impl DomainEvent for PaymentEvent {
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
        EventType::Payment
    }

    fn event_name(&self) -> &'static str {
        self.change.name()
    }
}
