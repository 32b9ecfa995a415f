//! # In-Memory Repositories
//!
//! In-memory implementations for testing and the demo binary.
//!
//! ## Available Repositories
//!
//! - [`InMemoryRfqRepository`]: RFQ persistence
//! - [`InMemoryQuotationRepository`]: Quotation rows and chains
//! - [`InMemoryPaymentRepository`]: Payment persistence
//! - [`InMemoryAcceptanceUnit`]: Acceptance across quotations and payments
//! - [`InMemoryRfqDeletionUnit`]: RFQ deletion guarded by its quotations
//! - [`InMemoryEventStore`]: Event streams
//!
//! ## Thread Safety
//!
//! Repositories use `Arc<RwLock<HashMap>>`. The acceptance unit shares the
//! quotation and payment maps and locks them in that order. The deletion
//! unit and a referencing quotation repository lock RFQs before quotations.

pub mod acceptance;
pub mod event_store;
pub mod payment_repository;
pub mod quotation_repository;
pub mod rfq_deletion;
pub mod rfq_repository;

pub use acceptance::InMemoryAcceptanceUnit;
pub use event_store::InMemoryEventStore;
pub use payment_repository::InMemoryPaymentRepository;
pub use quotation_repository::InMemoryQuotationRepository;
pub use rfq_deletion::InMemoryRfqDeletionUnit;
pub use rfq_repository::InMemoryRfqRepository;
