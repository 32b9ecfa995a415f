//! # Price Value Object
//!
//! Non-negative money amount used for unit prices, line totals, grand
//! totals and payment amounts.
//!
//! # Examples
//!
//! ```
//! use procurement_engine::domain::value_objects::Price;
//! use rust_decimal::Decimal;
//!
//! let unit = Price::new(Decimal::new(1250, 2)).unwrap();
//! assert_eq!(unit.to_string(), "12.50");
//! assert!(Price::new(Decimal::NEGATIVE_ONE).is_err());
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::arithmetic::{ArithmeticResult, CheckedArithmetic};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A non-negative money amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a price, rejecting negative values.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `value` is negative.
    pub fn new(value: Decimal) -> DomainResult<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(DomainError::validation(format!(
                "price must not be negative, got {value}"
            )));
        }
        Ok(Self(value))
    }

    /// Returns the wrapped decimal.
    #[inline]
    #[must_use]
    pub const fn get(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero.
    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is strictly positive.
    #[inline]
    #[must_use]
    pub fn is_positive(&self) -> bool {
        !self.0.is_zero() && self.0.is_sign_positive()
    }

    /// Adds two prices.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::Overflow` on overflow.
    pub fn safe_add(self, rhs: Self) -> ArithmeticResult<Self> {
        self.0.safe_add(rhs.0).map(Self)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl FromStr for Price {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s)
            .map_err(|e| DomainError::validation(format!("invalid price `{s}`: {e}")))?;
        Self::new(value)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn accepts_zero_and_positive() {
        assert!(Price::new(Decimal::ZERO).unwrap().is_zero());
        assert!(Price::new(Decimal::ONE).unwrap().is_positive());
    }

    #[test]
    fn rejects_negative() {
        assert!(matches!(
            Price::new(Decimal::new(-1, 2)),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn parses_from_str() {
        let price: Price = "19.99".parse().unwrap();
        assert_eq!(price.get(), Decimal::new(1999, 2));
        assert!("abc".parse::<Price>().is_err());
        assert!("-5".parse::<Price>().is_err());
    }

    #[test]
    fn adds() {
        let a: Price = "1.10".parse().unwrap();
        let b: Price = "2.20".parse().unwrap();
        assert_eq!(a.safe_add(b).unwrap().get(), Decimal::new(330, 2));
    }

    #[test]
    fn deserialize_validates() {
        assert!(serde_json::from_str::<Price>("\"-3\"").is_err());
        let price: Price = serde_json::from_str("\"3.50\"").unwrap();
        assert_eq!(price.to_string(), "3.50");
    }
}
