//! # Request DTOs
//!
//! Inputs accepted by the lifecycle services.

use crate::domain::entities::quotation::QuotationItemSpec;
use crate::domain::value_objects::timestamp::Timestamp;
use crate::domain::value_objects::{CompanyId, RfqType};
use serde::{Deserialize, Serialize};

/// Request to create an RFQ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRfq {
    /// Owning company.
    pub company_id: CompanyId,
    /// Title, must not be blank.
    pub title: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Open or invitation-only.
    #[serde(default)]
    pub rfq_type: RfqType,
    /// Response deadline.
    #[serde(default)]
    pub deadline: Option<Timestamp>,
}

impl NewRfq {
    /// Creates an open RFQ request without description or deadline.
    #[must_use]
    pub fn new(company_id: impl Into<CompanyId>, title: impl Into<String>) -> Self {
        Self {
            company_id: company_id.into(),
            title: title.into(),
            description: String::new(),
            rfq_type: RfqType::default(),
            deadline: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the RFQ type.
    #[must_use]
    pub fn rfq_type(mut self, rfq_type: RfqType) -> Self {
        self.rfq_type = rfq_type;
        self
    }

    /// Sets the deadline.
    #[must_use]
    pub fn deadline(mut self, deadline: Timestamp) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Replacement header fields of a draft RFQ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RfqDetails {
    /// New title.
    pub title: String,
    /// New description.
    #[serde(default)]
    pub description: String,
    /// New deadline, `None` clears it.
    #[serde(default)]
    pub deadline: Option<Timestamp>,
}

/// Request to start a supplier's quotation on an RFQ.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQuotation {
    /// Supplier notes.
    #[serde(default)]
    pub notes: String,
    /// Lines to add right away, validated like `add_item`.
    #[serde(default)]
    pub items: Vec<QuotationItemSpec>,
}

impl NewQuotation {
    /// Creates an empty request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the notes.
    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Adds an initial line.
    #[must_use]
    pub fn item(mut self, spec: QuotationItemSpec) -> Self {
        self.items.push(spec);
        self
    }
}
