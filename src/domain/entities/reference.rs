//! # Reference Records
//!
//! Read-only catalog records owned outside the engine: companies,
//! suppliers, categories, products and their quantity-tier discounts.
//!
//! The engine never mutates these; it only validates references against
//! them through the reference data gateway.

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::arithmetic::{ArithmeticResult, percent_of};
use crate::domain::value_objects::timestamp::Timestamp;
use crate::domain::value_objects::{CategoryId, CompanyId, DiscountId, ProductId, SupplierId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A buying institution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    /// Catalog key.
    pub id: CompanyId,
    /// Display name.
    pub name: String,
}

impl Company {
    /// Creates a company record.
    #[must_use]
    pub fn new(id: impl Into<CompanyId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A selling institution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    /// Catalog key.
    pub id: SupplierId,
    /// Display name.
    pub name: String,
}

impl Supplier {
    /// Creates a supplier record.
    #[must_use]
    pub fn new(id: impl Into<SupplierId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A product category, referenced by RFQ items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Catalog key.
    pub id: CategoryId,
    /// Display name.
    pub name: String,
}

impl Category {
    /// Creates a category record.
    #[must_use]
    pub fn new(id: impl Into<CategoryId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A product offered by one supplier in one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Catalog key.
    pub id: ProductId,
    /// Supplier offering the product.
    pub supplier_id: SupplierId,
    /// Category the product belongs to.
    pub category_id: CategoryId,
    /// Display name.
    pub name: String,
}

impl Product {
    /// Creates a product record.
    #[must_use]
    pub fn new(
        id: impl Into<ProductId>,
        supplier_id: impl Into<SupplierId>,
        category_id: impl Into<CategoryId>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            supplier_id: supplier_id.into(),
            category_id: category_id.into(),
            name: name.into(),
        }
    }

    /// Returns true if `supplier` may quote this product for `category`.
    #[must_use]
    pub fn is_offered_by(&self, supplier: &SupplierId, category: &CategoryId) -> bool {
        &self.supplier_id == supplier && &self.category_id == category
    }
}

/// How a product discount reduces a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountKind {
    /// `value` is a percentage of the line gross.
    Percentage,
    /// `value` is a fixed amount off the line.
    Amount,
}

impl fmt::Display for DiscountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Percentage => write!(f, "PERCENTAGE"),
            Self::Amount => write!(f, "AMOUNT"),
        }
    }
}

/// A quantity-tier discount configured on a product.
///
/// # Examples
///
/// ```
/// use procurement_engine::domain::entities::reference::{DiscountKind, ProductDiscount};
/// use procurement_engine::domain::value_objects::timestamp::Timestamp;
/// use rust_decimal::Decimal;
///
/// let tier = ProductDiscount::new(
///     "bulk-100", "pen-blue", DiscountKind::Percentage,
///     Decimal::new(5, 0), Decimal::new(100, 0),
/// ).unwrap();
///
/// assert!(tier.applies_to(Decimal::new(150, 0), Timestamp::now()));
/// assert!(!tier.applies_to(Decimal::new(99, 0), Timestamp::now()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDiscount {
    /// Catalog key.
    pub id: DiscountId,
    /// Product the tier belongs to.
    pub product_id: ProductId,
    /// Percentage or fixed amount.
    pub kind: DiscountKind,
    /// Percentage points or money amount, depending on `kind`.
    pub value: Decimal,
    /// Minimum quantity for the tier to apply.
    pub min_quantity: Decimal,
    /// Inactive tiers never apply.
    pub active: bool,
    /// Start of the validity window, inclusive.
    pub starts_at: Option<Timestamp>,
    /// End of the validity window, exclusive.
    pub ends_at: Option<Timestamp>,
}

impl ProductDiscount {
    /// Creates an active, open-ended tier.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a non-positive value, a
    /// percentage above 100 or a negative minimum quantity.
    pub fn new(
        id: impl Into<DiscountId>,
        product_id: impl Into<ProductId>,
        kind: DiscountKind,
        value: Decimal,
        min_quantity: Decimal,
    ) -> DomainResult<Self> {
        if value <= Decimal::ZERO {
            return Err(DomainError::validation("tier discount value must be positive"));
        }
        if kind == DiscountKind::Percentage && value > Decimal::ONE_HUNDRED {
            return Err(DomainError::validation(
                "tier discount percentage must not exceed 100",
            ));
        }
        if min_quantity.is_sign_negative() {
            return Err(DomainError::validation(
                "tier minimum quantity must not be negative",
            ));
        }
        Ok(Self {
            id: id.into(),
            product_id: product_id.into(),
            kind,
            value,
            min_quantity,
            active: true,
            starts_at: None,
            ends_at: None,
        })
    }

    /// Restricts the tier to `[starts_at, ends_at)`.
    #[must_use]
    pub fn with_window(mut self, starts_at: Option<Timestamp>, ends_at: Option<Timestamp>) -> Self {
        self.starts_at = starts_at;
        self.ends_at = ends_at;
        self
    }

    /// Marks the tier inactive.
    #[must_use]
    pub fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }

    /// Returns true if the tier applies to `quantity` at instant `at`.
    #[must_use]
    pub fn applies_to(&self, quantity: Decimal, at: Timestamp) -> bool {
        if !self.active || quantity < self.min_quantity {
            return false;
        }
        if self.starts_at.is_some_and(|start| at < start) {
            return false;
        }
        if self.ends_at.is_some_and(|end| at >= end) {
            return false;
        }
        true
    }

    /// Returns the unrounded reduction on `base`, never more than `base`.
    ///
    /// # Errors
    ///
    /// Returns an arithmetic error on overflow.
    pub fn reduction(&self, base: Decimal) -> ArithmeticResult<Decimal> {
        let raw = match self.kind {
            DiscountKind::Percentage => percent_of(base, self.value)?,
            DiscountKind::Amount => self.value,
        };
        Ok(raw.min(base))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn tier(kind: DiscountKind, value: i64, min: i64) -> ProductDiscount {
        ProductDiscount::new("d", "p", kind, Decimal::new(value, 0), Decimal::new(min, 0)).unwrap()
    }

    #[test]
    fn product_offering_matches_supplier_and_category() {
        let p = Product::new("p1", "s1", "c1", "Widget");
        assert!(p.is_offered_by(&"s1".into(), &"c1".into()));
        assert!(!p.is_offered_by(&"s2".into(), &"c1".into()));
        assert!(!p.is_offered_by(&"s1".into(), &"c2".into()));
    }

    #[test]
    fn rejects_bad_tiers() {
        assert!(ProductDiscount::new("d", "p", DiscountKind::Amount, Decimal::ZERO, Decimal::ONE).is_err());
        assert!(
            ProductDiscount::new("d", "p", DiscountKind::Percentage, Decimal::new(150, 0), Decimal::ONE)
                .is_err()
        );
    }

    #[test]
    fn inactive_tier_never_applies() {
        let t = tier(DiscountKind::Percentage, 5, 1).deactivated();
        assert!(!t.applies_to(Decimal::new(10, 0), Timestamp::now()));
    }

    #[test]
    fn window_is_half_open() {
        let start = Timestamp::from_secs(1_000).unwrap();
        let end = Timestamp::from_secs(2_000).unwrap();
        let t = tier(DiscountKind::Percentage, 5, 1).with_window(Some(start), Some(end));
        assert!(!t.applies_to(Decimal::ONE, Timestamp::from_secs(999).unwrap()));
        assert!(t.applies_to(Decimal::ONE, start));
        assert!(!t.applies_to(Decimal::ONE, end));
    }

    #[test]
    fn amount_reduction_is_capped() {
        let t = tier(DiscountKind::Amount, 80, 1);
        assert_eq!(t.reduction(Decimal::new(50, 0)).unwrap(), Decimal::new(50, 0));
    }
}
