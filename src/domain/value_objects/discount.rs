//! # Item Discount
//!
//! Discount a supplier grants on a single quotation line.

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::arithmetic::{ArithmeticResult, percent_of};
use crate::domain::value_objects::price::Price;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Line-level discount on a quotation item.
///
/// A percentage applies to the line gross; an amount is subtracted from the
/// whole line, not per unit.
///
/// # Examples
///
/// ```
/// use procurement_engine::domain::value_objects::ItemDiscount;
/// use rust_decimal::Decimal;
///
/// let ten_pct = ItemDiscount::percentage(Decimal::new(10, 0)).unwrap();
/// assert_eq!(ten_pct.reduction(Decimal::new(200, 0)).unwrap(), Decimal::new(20, 0));
/// assert!(ItemDiscount::percentage(Decimal::new(101, 0)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemDiscount {
    /// Percentage of the line gross, in (0, 100].
    Percentage(Decimal),
    /// Fixed amount off the line.
    Amount(Price),
}

impl ItemDiscount {
    /// Creates a percentage discount.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` unless `0 < percent <= 100`.
    pub fn percentage(percent: Decimal) -> DomainResult<Self> {
        let discount = Self::Percentage(percent);
        discount.validate()?;
        Ok(discount)
    }

    /// Creates a fixed amount discount.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the amount is zero.
    pub fn amount(amount: Price) -> DomainResult<Self> {
        let discount = Self::Amount(amount);
        discount.validate()?;
        Ok(discount)
    }

    /// Checks the discount on its own, independent of any line.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for an out-of-range value.
    pub fn validate(&self) -> DomainResult<()> {
        match self {
            Self::Percentage(p) => {
                if *p <= Decimal::ZERO || *p > Decimal::ONE_HUNDRED {
                    return Err(DomainError::validation(format!(
                        "discount percentage must be in (0, 100], got {p}"
                    )));
                }
            }
            Self::Amount(a) => {
                if !a.is_positive() {
                    return Err(DomainError::validation(
                        "discount amount must be positive",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Checks the discount against the line it applies to.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the discount is invalid or a
    /// fixed amount exceeds the line gross.
    pub fn validate_for_gross(&self, gross: Decimal) -> DomainResult<()> {
        self.validate()?;
        if let Self::Amount(a) = self {
            if a.get() > gross {
                return Err(DomainError::validation(format!(
                    "discount amount {a} exceeds line gross {gross}"
                )));
            }
        }
        Ok(())
    }

    /// Returns the unrounded reduction this discount yields on `gross`.
    ///
    /// # Errors
    ///
    /// Returns an arithmetic error on overflow.
    pub fn reduction(&self, gross: Decimal) -> ArithmeticResult<Decimal> {
        match self {
            Self::Percentage(p) => percent_of(gross, *p),
            Self::Amount(a) => Ok(a.get().min(gross)),
        }
    }
}

impl fmt::Display for ItemDiscount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Percentage(p) => write!(f, "{p}%"),
            Self::Amount(a) => write!(f, "-{a}"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn percentage_bounds() {
        assert!(ItemDiscount::percentage(Decimal::ZERO).is_err());
        assert!(ItemDiscount::percentage(Decimal::ONE_HUNDRED).is_ok());
        assert!(ItemDiscount::percentage(Decimal::new(1005, 1)).is_err());
    }

    #[test]
    fn amount_must_be_positive_and_within_gross() {
        assert!(ItemDiscount::amount(Price::ZERO).is_err());
        let d = ItemDiscount::amount("50".parse().unwrap()).unwrap();
        assert!(d.validate_for_gross(Decimal::new(50, 0)).is_ok());
        assert!(matches!(
            d.validate_for_gross(Decimal::new(49, 0)),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn amount_applies_to_whole_line() {
        let d = ItemDiscount::amount("5".parse().unwrap()).unwrap();
        assert_eq!(d.reduction(Decimal::new(100, 0)).unwrap(), Decimal::new(5, 0));
    }

    #[test]
    fn serde_shape() {
        let d = ItemDiscount::percentage(Decimal::new(15, 0)).unwrap();
        let json = serde_json::to_value(d).unwrap();
        assert_eq!(json["type"], "PERCENTAGE");
    }
}
