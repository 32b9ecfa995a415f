//! # Quantity Value Object
//!
//! Strictly positive amount of goods requested or offered.

use crate::domain::errors::{DomainError, DomainResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A strictly positive quantity.
///
/// # Examples
///
/// ```
/// use procurement_engine::domain::value_objects::Quantity;
///
/// let qty = Quantity::from_units(12).unwrap();
/// assert_eq!(qty.to_string(), "12");
/// assert!(Quantity::from_units(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Quantity(Decimal);

impl Quantity {
    /// Creates a quantity, rejecting zero and negative values.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `value` is not positive.
    pub fn new(value: Decimal) -> DomainResult<Self> {
        if value.is_zero() || value.is_sign_negative() {
            return Err(DomainError::validation(format!(
                "quantity must be positive, got {value}"
            )));
        }
        Ok(Self(value))
    }

    /// Creates a quantity from a whole number of units.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `units` is zero.
    pub fn from_units(units: u64) -> DomainResult<Self> {
        Self::new(Decimal::from(units))
    }

    /// Returns the wrapped decimal.
    #[inline]
    #[must_use]
    pub const fn get(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Decimal> for Quantity {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for Decimal {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

impl FromStr for Quantity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s)
            .map_err(|e| DomainError::validation(format!("invalid quantity `{s}`: {e}")))?;
        Self::new(value)
    }
}
