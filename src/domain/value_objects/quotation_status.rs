//! # Quotation Status
//!
//! Quotation lifecycle state machine.
//!
//! # State Machine
//!
//! ```text
//! Draft → Submitted → UnderReview
//!            ↓             ↓
//!            └─────────────┴→ Accepted | Rejected
//! ```
//!
//! `Submitted` and `UnderReview` are both "reviewable": a company may accept
//! or reject from either one.

use crate::domain::value_objects::enums::ParseEnumError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Quotation lifecycle status.
///
/// # Examples
///
/// ```
/// use procurement_engine::domain::value_objects::QuotationStatus;
///
/// assert!(QuotationStatus::Submitted.is_reviewable());
/// assert!(QuotationStatus::UnderReview.can_transition_to(QuotationStatus::Accepted));
/// assert!(!QuotationStatus::Draft.can_transition_to(QuotationStatus::Accepted));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum QuotationStatus {
    /// Being prepared by the supplier; private to the supplier.
    #[default]
    Draft = 0,
    /// Sent to the company.
    Submitted = 1,
    /// The company is evaluating it.
    UnderReview = 2,
    /// Accepted by the company (terminal).
    Accepted = 3,
    /// Rejected by the company (terminal).
    Rejected = 4,
}

impl QuotationStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Draft,
        Self::Submitted,
        Self::UnderReview,
        Self::Accepted,
        Self::Rejected,
    ];

    /// Returns true if this is a terminal status.
    #[inline]
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }

    /// Returns true if the company may accept or reject from this status.
    #[inline]
    #[must_use]
    pub const fn is_reviewable(&self) -> bool {
        matches!(self, Self::Submitted | Self::UnderReview)
    }

    /// Returns true if items and discounts may still change.
    #[inline]
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Returns true if this status can transition to the target status.
    ///
    /// - Draft → Submitted
    /// - Submitted → UnderReview, Accepted, Rejected
    /// - UnderReview → Accepted, Rejected
    /// - Accepted, Rejected → (none)
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Draft, Self::Submitted)
                | (Self::Submitted, Self::UnderReview)
                | (Self::Submitted, Self::Accepted)
                | (Self::Submitted, Self::Rejected)
                | (Self::UnderReview, Self::Accepted)
                | (Self::UnderReview, Self::Rejected)
        )
    }

    /// Returns the valid next statuses.
    #[must_use]
    pub fn valid_transitions(&self) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|target| self.can_transition_to(*target))
            .collect()
    }
}

impl fmt::Display for QuotationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Draft => "DRAFT",
            Self::Submitted => "SUBMITTED",
            Self::UnderReview => "UNDER_REVIEW",
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
        };
        write!(f, "{s}")
    }
}

impl FromStr for QuotationStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "DRAFT" => Ok(Self::Draft),
            "SUBMITTED" => Ok(Self::Submitted),
            "UNDER_REVIEW" => Ok(Self::UnderReview),
            "ACCEPTED" => Ok(Self::Accepted),
            "REJECTED" => Ok(Self::Rejected),
            _ => Err(ParseEnumError::InvalidValue(
                "QuotationStatus",
                s.to_string(),
            )),
        }
    }
}
