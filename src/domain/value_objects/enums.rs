//! # Domain Enums
//!
//! Small enumerations used across the procurement domain:
//!
//! - [`RfqType`] - Who may quote against an RFQ
//! - [`InvitationStatus`] - Whether a supplier invitation is still active
//!
//! All enums implement `Display`, `FromStr` and Serde traits with
//! SCREAMING_SNAKE_CASE names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when parsing an enum from a string fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseEnumError {
    /// The value is not a known variant.
    #[error("invalid {0} value: {1}")]
    InvalidValue(&'static str, String),
}

/// Audience of an RFQ.
///
/// # Examples
///
/// ```
/// use procurement_engine::domain::value_objects::RfqType;
///
/// assert!(RfqType::Invited.requires_invitation());
/// assert_eq!("open".parse::<RfqType>().unwrap(), RfqType::Open);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RfqType {
    /// Any supplier may submit a quotation.
    #[default]
    Open,
    /// Only invited suppliers may see the RFQ and quote.
    Invited,
}

impl RfqType {
    /// Returns true if suppliers need an invitation to quote.
    #[inline]
    #[must_use]
    pub const fn requires_invitation(self) -> bool {
        matches!(self, Self::Invited)
    }
}

impl fmt::Display for RfqType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Invited => write!(f, "INVITED"),
        }
    }
}

impl FromStr for RfqType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "OPEN" => Ok(Self::Open),
            "INVITED" => Ok(Self::Invited),
            _ => Err(ParseEnumError::InvalidValue("RfqType", s.to_string())),
        }
    }
}

/// Status of a supplier invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvitationStatus {
    /// The supplier may quote.
    #[default]
    Pending,
    /// The company withdrew the invitation.
    Revoked,
}

impl InvitationStatus {
    /// Returns true if the invitation grants access to the RFQ.
    #[inline]
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Revoked => write!(f, "REVOKED"),
        }
    }
}

impl FromStr for InvitationStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "REVOKED" => Ok(Self::Revoked),
            _ => Err(ParseEnumError::InvalidValue(
                "InvitationStatus",
                s.to_string(),
            )),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn rfq_type_display_and_parse() {
        for ty in [RfqType::Open, RfqType::Invited] {
            assert_eq!(ty.to_string().parse::<RfqType>().unwrap(), ty);
        }
        assert!("closed".parse::<RfqType>().is_err());
    }

    #[test]
    fn rfq_type_serde_uses_screaming_case() {
        assert_eq!(serde_json::to_string(&RfqType::Invited).unwrap(), "\"INVITED\"");
    }

    #[test]
    fn invitation_status_activity() {
        assert!(InvitationStatus::Pending.is_active());
        assert!(!InvitationStatus::Revoked.is_active());
        assert_eq!(
            "revoked".parse::<InvitationStatus>().unwrap(),
            InvitationStatus::Revoked
        );
    }
}
