//! # Checked Arithmetic
//!
//! Overflow-safe money math on [`Decimal`].
//!
//! - [`ArithmeticError`] - Error type for arithmetic failures
//! - [`CheckedArithmetic`] - Trait for safe arithmetic operations
//! - [`percent_of`] - Percentage of an amount
//! - [`round_money`] - Rounding to a money scale
//!
//! # Examples
//!
//! ```
//! use procurement_engine::domain::value_objects::arithmetic::{CheckedArithmetic, percent_of};
//! use rust_decimal::Decimal;
//!
//! let gross = Decimal::new(250, 0);
//! let off = percent_of(gross, Decimal::new(10, 0)).unwrap();
//! assert_eq!(gross.safe_sub(off).unwrap(), Decimal::new(225, 0));
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Error type for arithmetic operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ArithmeticError {
    /// Arithmetic operation resulted in overflow.
    #[error("arithmetic overflow")]
    Overflow,

    /// Arithmetic operation resulted in underflow.
    #[error("arithmetic underflow")]
    Underflow,

    /// Division by zero attempted.
    #[error("division by zero")]
    DivisionByZero,
}

/// Result type for arithmetic operations.
pub type ArithmeticResult<T> = Result<T, ArithmeticError>;

/// Trait for checked arithmetic operations.
///
/// Returns `Result` instead of panicking on overflow, underflow or
/// division by zero.
pub trait CheckedArithmetic: Sized {
    /// Safely add two values.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::Overflow` if the result would overflow.
    fn safe_add(self, rhs: Self) -> ArithmeticResult<Self>;

    /// Safely subtract two values.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::Underflow` if the result would underflow.
    fn safe_sub(self, rhs: Self) -> ArithmeticResult<Self>;

    /// Safely multiply two values.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::Overflow` if the result would overflow.
    fn safe_mul(self, rhs: Self) -> ArithmeticResult<Self>;

    /// Safely divide two values.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::DivisionByZero` if the divisor is zero.
    fn safe_div(self, rhs: Self) -> ArithmeticResult<Self>;
}

impl CheckedArithmetic for Decimal {
    #[inline]
    fn safe_add(self, rhs: Self) -> ArithmeticResult<Self> {
        self.checked_add(rhs).ok_or(ArithmeticError::Overflow)
    }

    #[inline]
    fn safe_sub(self, rhs: Self) -> ArithmeticResult<Self> {
        self.checked_sub(rhs).ok_or(ArithmeticError::Underflow)
    }

    #[inline]
    fn safe_mul(self, rhs: Self) -> ArithmeticResult<Self> {
        self.checked_mul(rhs).ok_or(ArithmeticError::Overflow)
    }

    #[inline]
    fn safe_div(self, rhs: Self) -> ArithmeticResult<Self> {
        if rhs.is_zero() {
            return Err(ArithmeticError::DivisionByZero);
        }
        self.checked_div(rhs).ok_or(ArithmeticError::Overflow)
    }
}

impl CheckedArithmetic for u32 {
    #[inline]
    fn safe_add(self, rhs: Self) -> ArithmeticResult<Self> {
        self.checked_add(rhs).ok_or(ArithmeticError::Overflow)
    }

    #[inline]
    fn safe_sub(self, rhs: Self) -> ArithmeticResult<Self> {
        self.checked_sub(rhs).ok_or(ArithmeticError::Underflow)
    }

    #[inline]
    fn safe_mul(self, rhs: Self) -> ArithmeticResult<Self> {
        self.checked_mul(rhs).ok_or(ArithmeticError::Overflow)
    }

    #[inline]
    fn safe_div(self, rhs: Self) -> ArithmeticResult<Self> {
        self.checked_div(rhs).ok_or(ArithmeticError::DivisionByZero)
    }
}

/// Returns `percent`% of `amount`.
///
/// # Errors
///
/// Returns `ArithmeticError::Overflow` if the product overflows.
#[inline]
pub fn percent_of(amount: Decimal, percent: Decimal) -> ArithmeticResult<Decimal> {
    amount
        .safe_mul(percent)?
        .safe_div(Decimal::ONE_HUNDRED)
}

/// Rounds a money amount to `scale` decimal places, midpoint away from zero.
#[inline]
#[must_use]
pub fn round_money(amount: Decimal, scale: u32) -> Decimal {
    amount.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_correctly() {
        assert_eq!(ArithmeticError::Overflow.to_string(), "arithmetic overflow");
        assert_eq!(ArithmeticError::Underflow.to_string(), "arithmetic underflow");
        assert_eq!(ArithmeticError::DivisionByZero.to_string(), "division by zero");
    }

    mod decimal {
        use super::*;

        #[test]
        fn safe_ops_work() {
            let a = Decimal::new(100, 0);
            let b = Decimal::new(4, 0);
            assert_eq!(a.safe_add(b).unwrap(), Decimal::new(104, 0));
            assert_eq!(a.safe_sub(b).unwrap(), Decimal::new(96, 0));
            assert_eq!(a.safe_mul(b).unwrap(), Decimal::new(400, 0));
            assert_eq!(a.safe_div(b).unwrap(), Decimal::new(25, 0));
        }

        #[test]
        fn safe_div_by_zero_fails() {
            assert_eq!(
                Decimal::ONE.safe_div(Decimal::ZERO),
                Err(ArithmeticError::DivisionByZero)
            );
        }

        #[test]
        fn safe_mul_overflow_fails() {
            assert_eq!(
                Decimal::MAX.safe_mul(Decimal::TWO),
                Err(ArithmeticError::Overflow)
            );
        }
    }

    mod version_numbers {
        use super::*;

        #[test]
        fn safe_add_overflow_fails() {
            assert_eq!(u32::MAX.safe_add(1), Err(ArithmeticError::Overflow));
            assert_eq!(1u32.safe_add(1).unwrap(), 2);
        }

        #[test]
        fn safe_sub_underflow_fails() {
            assert_eq!(0u32.safe_sub(1), Err(ArithmeticError::Underflow));
        }
    }

    #[test]
    fn percent_of_amount() {
        let result = percent_of(Decimal::new(1999, 2), Decimal::new(15, 0)).unwrap();
        assert_eq!(result, Decimal::new(29985, 4));
    }

    #[test]
    fn round_money_midpoint_away_from_zero() {
        assert_eq!(round_money(Decimal::new(12345, 3), 2), Decimal::new(1235, 2));
        assert_eq!(round_money(Decimal::new(12344, 3), 2), Decimal::new(1234, 2));
        assert_eq!(round_money(Decimal::new(-12345, 3), 2), Decimal::new(-1235, 2));
    }
}
