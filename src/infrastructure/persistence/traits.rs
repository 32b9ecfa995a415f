//! # Repository Traits
//!
//! Port definitions for persistence abstraction.
//!
//! Every write is a compare-and-swap on the aggregate's `version`: callers
//! load an aggregate, remember its version, mutate it through domain
//! methods and pass the remembered version back as `expected_version`. A
//! store whose row moved on in between answers
//! [`RepositoryError::VersionConflict`].
//!
//! Operations that touch more than one row (revisions, revision deletion,
//! acceptance) are single trait methods so each adapter can apply them
//! atomically.
//!
//! # Available Repositories
//!
//! - [`RfqRepository`]: RFQ documents
//! - [`QuotationRepository`]: Quotation rows and version chains
//! - [`PaymentRepository`]: Payments, unique per order
//! - [`AcceptanceUnitOfWork`]: Quotation acceptance plus payment creation
//! - [`RfqDeletionUnit`]: RFQ deletion guarded by its quotations

use crate::domain::entities::payment::Payment;
use crate::domain::entities::quotation::Quotation;
use crate::domain::entities::rfq::Rfq;
use crate::domain::value_objects::{
    CompanyId, OrderId, PaymentId, QuotationId, QuotationStatus, RfqId, RfqStatus, SupplierId,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error type for repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Entity not found.
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        /// Type of entity.
        entity_type: &'static str,
        /// Entity identifier.
        id: String,
    },

    /// A uniqueness rule was violated.
    #[error("Duplicate entity: {entity_type} with key {id} already exists")]
    Duplicate {
        /// Type of entity.
        entity_type: &'static str,
        /// Violated key.
        id: String,
    },

    /// Optimistic locking conflict.
    #[error("Version conflict: {entity_type} with id {id} has been modified")]
    VersionConflict {
        /// Type of entity.
        entity_type: &'static str,
        /// Entity identifier.
        id: String,
        /// Expected version.
        expected: u64,
        /// Actual version.
        actual: u64,
    },

    /// Other rows still reference the entity.
    #[error("{entity_type} {id} is referenced by {references} row(s)")]
    Referenced {
        /// Type of entity.
        entity_type: &'static str,
        /// Entity identifier.
        id: String,
        /// Number of referencing rows seen.
        references: u64,
    },

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query error.
    #[error("Query error: {0}")]
    Query(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RepositoryError {
    /// Creates a not found error.
    #[must_use]
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    /// Creates a duplicate error.
    #[must_use]
    pub fn duplicate(entity_type: &'static str, id: impl ToString) -> Self {
        Self::Duplicate {
            entity_type,
            id: id.to_string(),
        }
    }

    /// Creates a version conflict error.
    #[must_use]
    pub fn version_conflict(
        entity_type: &'static str,
        id: impl ToString,
        expected: u64,
        actual: u64,
    ) -> Self {
        Self::VersionConflict {
            entity_type,
            id: id.to_string(),
            expected,
            actual,
        }
    }

    /// Creates a referenced error.
    #[must_use]
    pub fn referenced(entity_type: &'static str, id: impl ToString, references: u64) -> Self {
        Self::Referenced {
            entity_type,
            id: id.to_string(),
            references,
        }
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error.
    #[must_use]
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if this is a duplicate error.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }

    /// Returns true if this is a version conflict error.
    #[must_use]
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }

    /// Returns true if other rows still reference the entity.
    #[must_use]
    pub fn is_referenced(&self) -> bool {
        matches!(self, Self::Referenced { .. })
    }

    /// Returns true if retrying the same operation may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Filter for listing RFQs. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RfqFilter {
    /// Owning company.
    pub company_id: Option<CompanyId>,
    /// Lifecycle status.
    pub status: Option<RfqStatus>,
}

impl RfqFilter {
    /// Returns true if `rfq` passes the filter.
    #[must_use]
    pub fn matches(&self, rfq: &Rfq) -> bool {
        self.company_id
            .as_ref()
            .is_none_or(|c| rfq.company_id() == c)
            && self.status.is_none_or(|s| rfq.status() == s)
    }
}

/// Filter for listing quotations. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotationFilter {
    /// Answered RFQ.
    pub rfq_id: Option<RfqId>,
    /// Quoting supplier.
    pub supplier_id: Option<SupplierId>,
    /// Lifecycle status.
    pub status: Option<QuotationStatus>,
    /// Only rows flagged current.
    pub current_only: bool,
}

impl QuotationFilter {
    /// Returns true if `quotation` passes the filter.
    #[must_use]
    pub fn matches(&self, quotation: &Quotation) -> bool {
        self.rfq_id.is_none_or(|r| quotation.rfq_id() == r)
            && self
                .supplier_id
                .as_ref()
                .is_none_or(|s| quotation.supplier_id() == s)
            && self.status.is_none_or(|s| quotation.status() == s)
            && (!self.current_only || quotation.is_current())
    }
}

/// Repository for RFQ documents.
#[async_trait]
pub trait RfqRepository: Send + Sync + fmt::Debug {
    /// Stores a new RFQ.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Duplicate` if the ID is taken.
    async fn insert(&self, rfq: &Rfq) -> RepositoryResult<()>;

    /// Replaces a stored RFQ if its version still equals `expected_version`.
    ///
    /// # Errors
    ///
    /// - `RepositoryError::NotFound` if the RFQ does not exist
    /// - `RepositoryError::VersionConflict` if it was modified since loaded
    async fn update(&self, rfq: &Rfq, expected_version: u64) -> RepositoryResult<()>;

    /// Gets an RFQ by ID.
    async fn get(&self, id: &RfqId) -> RepositoryResult<Option<Rfq>>;

    /// Lists RFQs matching `filter`, oldest first.
    async fn list(&self, filter: &RfqFilter) -> RepositoryResult<Vec<Rfq>>;
}

/// Repository for quotation rows.
///
/// Rows of one `(RFQ, supplier)` pair form a version chain with exactly one
/// row flagged current. Implementations reject a second current row for
/// the same pair with `RepositoryError::Duplicate`.
#[async_trait]
pub trait QuotationRepository: Send + Sync + fmt::Debug {
    /// Stores the first row of a new chain.
    ///
    /// # Errors
    ///
    /// - `RepositoryError::Duplicate` if the ID is taken or the pair
    ///   already has a current row
    /// - `RepositoryError::NotFound` if the store tracks RFQs and the
    ///   referenced one is gone
    async fn insert(&self, quotation: &Quotation) -> RepositoryResult<()>;

    /// Replaces a row if its version still equals `expected_version`.
    ///
    /// # Errors
    ///
    /// - `RepositoryError::NotFound` if the row does not exist
    /// - `RepositoryError::VersionConflict` if it was modified since loaded
    async fn update(&self, quotation: &Quotation, expected_version: u64) -> RepositoryResult<()>;

    /// Gets a row by ID.
    async fn get(&self, id: &QuotationId) -> RepositoryResult<Option<Quotation>>;

    /// Lists rows matching `filter`, oldest first.
    async fn list(&self, filter: &QuotationFilter) -> RepositoryResult<Vec<Quotation>>;

    /// Returns every row of one chain, by ascending version number.
    async fn find_chain(
        &self,
        rfq_id: &RfqId,
        supplier_id: &SupplierId,
    ) -> RepositoryResult<Vec<Quotation>>;

    /// Atomically stores `revision` and writes `superseded`, the prior
    /// current row with its flag cleared.
    ///
    /// # Errors
    ///
    /// `RepositoryError::VersionConflict` if `superseded` moved on; nothing
    /// is written in that case.
    async fn insert_revision(
        &self,
        revision: &Quotation,
        superseded: &Quotation,
        expected_superseded_version: u64,
    ) -> RepositoryResult<()>;

    /// Atomically deletes a row and, if given, writes `promoted`, the row
    /// taking over the current flag.
    ///
    /// # Errors
    ///
    /// `RepositoryError::VersionConflict` if either row moved on; nothing
    /// is written in that case.
    async fn delete_revision(
        &self,
        id: &QuotationId,
        expected_version: u64,
        promoted: Option<(&Quotation, u64)>,
    ) -> RepositoryResult<()>;
}

/// Repository for payments.
#[async_trait]
pub trait PaymentRepository: Send + Sync + fmt::Debug {
    /// Stores a new payment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Duplicate` if the order already has one.
    async fn insert(&self, payment: &Payment) -> RepositoryResult<()>;

    /// Replaces a payment if its version still equals `expected_version`.
    ///
    /// # Errors
    ///
    /// - `RepositoryError::NotFound` if the payment does not exist
    /// - `RepositoryError::VersionConflict` if it was modified since loaded
    async fn update(&self, payment: &Payment, expected_version: u64) -> RepositoryResult<()>;

    /// Gets a payment by ID.
    async fn get(&self, id: &PaymentId) -> RepositoryResult<Option<Payment>>;

    /// Gets the payment settling an order.
    async fn get_by_order(&self, order_id: &OrderId) -> RepositoryResult<Option<Payment>>;

    /// Lists a company's payments, oldest first.
    async fn find_by_company(&self, company_id: &CompanyId) -> RepositoryResult<Vec<Payment>>;
}

/// The one write spanning two aggregates: accepting a quotation and
/// opening its payment.
#[async_trait]
pub trait AcceptanceUnitOfWork: Send + Sync + fmt::Debug {
    /// Writes the accepted quotation and inserts the payment together.
    ///
    /// # Errors
    ///
    /// - `RepositoryError::VersionConflict` if the quotation moved on
    /// - `RepositoryError::Duplicate` if the order already has a payment or
    ///   another row of the chain is already accepted
    ///
    /// Nothing is written when an error is returned.
    async fn commit_acceptance(
        &self,
        quotation: &Quotation,
        expected_version: u64,
        payment: &Payment,
    ) -> RepositoryResult<()>;
}

/// Hard deletion of an RFQ nobody has quoted on.
///
/// The quotation check and the delete are one store operation: a quotation
/// inserted concurrently either blocks the delete or fails itself.
#[async_trait]
pub trait RfqDeletionUnit: Send + Sync + fmt::Debug {
    /// Deletes the RFQ if its version still equals `expected_version` and
    /// no quotation row references it.
    ///
    /// # Errors
    ///
    /// - `RepositoryError::NotFound` if the RFQ does not exist
    /// - `RepositoryError::VersionConflict` if it was modified since loaded
    /// - `RepositoryError::Referenced` if any quotation references it
    ///
    /// Nothing is deleted when an error is returned.
    async fn delete_unquoted(&self, id: &RfqId, expected_version: u64) -> RepositoryResult<()>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn only_connection_errors_are_transient() {
        assert!(RepositoryError::connection("reset").is_transient());
        assert!(!RepositoryError::query("syntax").is_transient());
        assert!(!RepositoryError::version_conflict("RFQ", "x", 1, 2).is_transient());
    }

    #[test]
    fn error_display() {
        let err = RepositoryError::duplicate("Payment", "order-1");
        assert!(err.to_string().contains("order-1"));
        assert!(err.is_duplicate());

        let err = RepositoryError::referenced("RFQ", "rfq-1", 2);
        assert_eq!(err.to_string(), "RFQ rfq-1 is referenced by 2 row(s)");
        assert!(err.is_referenced());
        assert!(!err.is_transient());
    }

    #[test]
    fn empty_filters_match_everything() {
        use crate::domain::entities::rfq::Rfq;
        let rfq = Rfq::builder(CompanyId::new("acme"), "t").build().unwrap();
        assert!(RfqFilter::default().matches(&rfq));
        let filter = RfqFilter {
            company_id: Some(CompanyId::new("other")),
            status: None,
        };
        assert!(!filter.matches(&rfq));
    }
}
