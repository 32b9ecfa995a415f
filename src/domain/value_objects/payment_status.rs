//! # Payment Status
//!
//! Payment lifecycle state machine.
//!
//! ```text
//! Pending → Processing → Completed → Refunded
//!    │          │
//!    ├──────────┴→ Failed
//!    └→ Completed
//! ```

use crate::domain::value_objects::enums::ParseEnumError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Payment lifecycle status.
///
/// `Failed` and `Refunded` are terminal. `Completed` only moves on to
/// `Refunded`.
///
/// # Examples
///
/// ```
/// use procurement_engine::domain::value_objects::PaymentStatus;
///
/// assert!(PaymentStatus::Completed.can_transition_to(PaymentStatus::Refunded));
/// assert!(!PaymentStatus::Completed.can_transition_to(PaymentStatus::Failed));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum PaymentStatus {
    /// Created, awaiting processing.
    #[default]
    Pending = 0,
    /// Handed to the payment provider.
    Processing = 1,
    /// Funds settled.
    Completed = 2,
    /// Settlement failed (terminal).
    Failed = 3,
    /// Funds returned (terminal).
    Refunded = 4,
}

impl PaymentStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Completed,
        Self::Failed,
        Self::Refunded,
    ];

    /// Returns true if no further transition is possible.
    #[inline]
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed | Self::Refunded)
    }

    /// Returns true while the payment has not been settled or failed.
    #[inline]
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }

    /// Returns true if this status can transition to the target status.
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Processing)
                | (Self::Pending, Self::Completed)
                | (Self::Pending, Self::Failed)
                | (Self::Processing, Self::Completed)
                | (Self::Processing, Self::Failed)
                | (Self::Completed, Self::Refunded)
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

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Refunded => "REFUNDED",
        };
        write!(f, "{s}")
    }
}

impl FromStr for PaymentStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "PROCESSING" => Ok(Self::Processing),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            "REFUNDED" => Ok(Self::Refunded),
            _ => Err(ParseEnumError::InvalidValue("PaymentStatus", s.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn open_statuses_settle_or_fail() {
        for from in [PaymentStatus::Pending, PaymentStatus::Processing] {
            assert!(from.is_open());
            assert!(from.can_transition_to(PaymentStatus::Completed));
            assert!(from.can_transition_to(PaymentStatus::Failed));
            assert!(!from.can_transition_to(PaymentStatus::Refunded));
        }
    }

    #[test]
    fn completed_only_refunds() {
        assert_eq!(
            PaymentStatus::Completed.valid_transitions(),
            vec![PaymentStatus::Refunded]
        );
    }

    #[test]
    fn terminal_statuses() {
        for status in [PaymentStatus::Failed, PaymentStatus::Refunded] {
            assert!(status.is_terminal());
            assert!(status.valid_transitions().is_empty());
        }
        assert!(!PaymentStatus::Completed.is_terminal());
    }

    #[test]
    fn display_roundtrip() {
        for status in PaymentStatus::ALL {
            assert_eq!(status.to_string().parse::<PaymentStatus>().unwrap(), status);
        }
    }
}
