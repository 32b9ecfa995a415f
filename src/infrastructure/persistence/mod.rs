//! # Persistence Layer
//!
//! Repository ports, their adapters and the event store.
//!
//! ## Repository Traits (Ports)
//!
//! - [`RfqRepository`]: RFQ documents
//! - [`QuotationRepository`]: Quotation rows and version chains
//! - [`PaymentRepository`]: Payments
//! - [`AcceptanceUnitOfWork`]: Acceptance plus payment creation
//! - [`RfqDeletionUnit`]: RFQ deletion guarded by its quotations
//! - [`EventStore`]: Append-only domain event log
//!
//! ## Implementations
//!
//! - `in_memory`: `Arc<RwLock<HashMap>>` stores for tests and the demo
//! - `postgres`: sqlx stores with JSONB documents

pub mod event_store;
pub mod in_memory;
pub mod postgres;
pub mod traits;

pub use event_store::{EventStore, EventStoreError, EventStoreResult, StoredEvent};
pub use traits::{
    AcceptanceUnitOfWork, PaymentRepository, QuotationFilter, QuotationRepository,
    RepositoryError, RepositoryResult, RfqDeletionUnit, RfqFilter, RfqRepository,
};
