//! # RFQ Status
//!
//! RFQ lifecycle state machine.
//!
//! # State Machine
//!
//! ```text
//! Draft → Published → Closed
//!   ↓         ↓
//!   └─────────┴→ Cancelled
//! ```
//!
//! # Examples
//!
//! ```
//! use procurement_engine::domain::value_objects::RfqStatus;
//!
//! assert!(RfqStatus::Draft.can_transition_to(RfqStatus::Published));
//! assert!(!RfqStatus::Closed.can_transition_to(RfqStatus::Cancelled));
//! ```

use crate::domain::value_objects::enums::ParseEnumError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// RFQ lifecycle status.
///
/// # Terminal States
///
/// - [`Closed`](RfqStatus::Closed) - no further quotations are taken
/// - [`Cancelled`](RfqStatus::Cancelled) - withdrawn by the company
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum RfqStatus {
    /// Being prepared; items may change.
    #[default]
    Draft = 0,
    /// Visible to suppliers; items are frozen.
    Published = 1,
    /// Closed for new quotations (terminal).
    Closed = 2,
    /// Cancelled (terminal).
    Cancelled = 3,
}

impl RfqStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 4] = [Self::Draft, Self::Published, Self::Closed, Self::Cancelled];

    /// Returns true if this is a terminal status.
    #[inline]
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Cancelled)
    }

    /// Returns true if this status can transition to the target status.
    ///
    /// - Draft → Published, Cancelled
    /// - Published → Closed, Cancelled
    /// - Closed, Cancelled → (none)
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Draft, Self::Published)
                | (Self::Draft, Self::Cancelled)
                | (Self::Published, Self::Closed)
                | (Self::Published, Self::Cancelled)
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

    /// Returns true if line items and details may still be edited.
    #[inline]
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Returns true if suppliers may start or submit quotations.
    #[inline]
    #[must_use]
    pub const fn accepts_quotations(&self) -> bool {
        matches!(self, Self::Published)
    }
}

impl fmt::Display for RfqStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Draft => "DRAFT",
            Self::Published => "PUBLISHED",
            Self::Closed => "CLOSED",
            Self::Cancelled => "CANCELLED",
        };
        write!(f, "{s}")
    }
}

impl FromStr for RfqStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DRAFT" => Ok(Self::Draft),
            "PUBLISHED" => Ok(Self::Published),
            "CLOSED" => Ok(Self::Closed),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(ParseEnumError::InvalidValue("RfqStatus", s.to_string())),
        }
    }
}
