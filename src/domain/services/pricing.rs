//! # Pricing Calculator
//!
//! Computes the effective price of a quotation line.
//!
//! The same calculator prices lines while a supplier edits a draft, again
//! at submission time with a fresh discount snapshot, and derives the
//! effective unit prices shown by the comparison engine.
//!
//! # Algorithm
//!
//! 1. `gross = unit_price × quantity`
//! 2. subtract the item-level discount, if any
//! 3. among the product's tiers that apply (active, inside their validity
//!    window, quantity at or above the tier minimum), take the single one
//!    with the largest reduction on what remains; tiers never stack
//! 4. clamp at zero and round to the money scale (midpoint away from zero)
//!
//! # Examples
//!
//! ```
//! use procurement_engine::domain::services::pricing::PricingCalculator;
//! use procurement_engine::domain::value_objects::{ItemDiscount, Price, Quantity, Timestamp};
//! use rust_decimal::Decimal;
//!
//! let calc = PricingCalculator::default();
//! let line = calc
//!     .effective_price(
//!         Price::new(Decimal::new(10, 0)).unwrap(),
//!         Quantity::from_units(3).unwrap(),
//!         Some(&ItemDiscount::percentage(Decimal::new(10, 0)).unwrap()),
//!         &[],
//!         Timestamp::now(),
//!     )
//!     .unwrap();
//!
//! assert_eq!(line.line_total.get(), Decimal::new(27, 0));
//! ```

use crate::domain::entities::reference::ProductDiscount;
use crate::domain::errors::DomainResult;
use crate::domain::value_objects::arithmetic::{CheckedArithmetic, round_money};
use crate::domain::value_objects::{DiscountId, ItemDiscount, Price, Quantity, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default number of decimal places for money amounts.
pub const DEFAULT_MONEY_SCALE: u32 = 2;

/// Result of pricing one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    /// `unit_price × quantity`, rounded.
    pub gross: Price,
    /// Reduction from the item-level discount, rounded.
    pub item_discount_amount: Price,
    /// Reduction from the winning product tier, rounded.
    pub tier_discount_amount: Price,
    /// Final line total, rounded once from exact arithmetic.
    pub line_total: Price,
    /// Winning product tier, if any applied.
    pub applied_discount_id: Option<DiscountId>,
}

/// Stateless line pricer configured with a money scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingCalculator {
    money_scale: u32,
}

impl Default for PricingCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_MONEY_SCALE)
    }
}

impl PricingCalculator {
    /// Creates a calculator rounding to `money_scale` decimal places.
    #[must_use]
    pub const fn new(money_scale: u32) -> Self {
        Self { money_scale }
    }

    /// Returns the configured money scale.
    #[inline]
    #[must_use]
    pub const fn money_scale(&self) -> u32 {
        self.money_scale
    }

    /// Rounds an amount to the money scale.
    #[inline]
    #[must_use]
    pub fn round(&self, amount: Decimal) -> Decimal {
        round_money(amount, self.money_scale)
    }

    /// Prices one line.
    ///
    /// Every tier in `product_discounts` competes; callers pass only the
    /// tiers of the line's own product, fetched for this call.
    ///
    /// # Errors
    ///
    /// - `DomainError::Validation` if the item discount is out of range or a
    ///   fixed amount exceeds the line gross
    /// - `DomainError::Arithmetic` on overflow
    pub fn effective_price(
        &self,
        unit_price: Price,
        quantity: Quantity,
        item_discount: Option<&ItemDiscount>,
        product_discounts: &[ProductDiscount],
        at: Timestamp,
    ) -> DomainResult<PricedLine> {
        let gross = unit_price.get().safe_mul(quantity.get())?;

        let item_reduction = match item_discount {
            Some(discount) => {
                discount.validate_for_gross(gross)?;
                discount.reduction(gross)?
            }
            None => Decimal::ZERO,
        };
        let after_item = gross.safe_sub(item_reduction)?.max(Decimal::ZERO);

        let mut best: Option<(&ProductDiscount, Decimal)> = None;
        for tier in product_discounts
            .iter()
            .filter(|t| t.applies_to(quantity.get(), at))
        {
            let reduction = tier.reduction(after_item)?;
            let better = match best {
                None => reduction > Decimal::ZERO,
                Some((current, current_reduction)) => {
                    reduction > current_reduction
                        || (reduction == current_reduction && tier.id < current.id)
                }
            };
            if better {
                best = Some((tier, reduction));
            }
        }

        let tier_reduction = best.map_or(Decimal::ZERO, |(_, r)| r);
        let total = after_item.safe_sub(tier_reduction)?.max(Decimal::ZERO);

        let line = PricedLine {
            gross: self.money(gross)?,
            item_discount_amount: self.money(item_reduction)?,
            tier_discount_amount: self.money(tier_reduction)?,
            line_total: self.money(total)?,
            applied_discount_id: best.map(|(tier, _)| tier.id.clone()),
        };

        debug!(
            gross = %line.gross,
            item_discount = %line.item_discount_amount,
            tier_discount = %line.tier_discount_amount,
            line_total = %line.line_total,
            applied_discount = ?line.applied_discount_id,
            "priced line"
        );

        Ok(line)
    }

    /// Derives the effective unit price from a line total.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Arithmetic` on overflow.
    pub fn effective_unit_price(&self, line_total: Price, quantity: Quantity) -> DomainResult<Price> {
        let unit = line_total.get().safe_div(quantity.get())?;
        self.money(unit)
    }

    /// Sums line totals into a grand total.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Arithmetic` on overflow.
    pub fn grand_total<I>(&self, line_totals: I) -> DomainResult<Price>
    where
        I: IntoIterator<Item = Price>,
    {
        let mut sum = Price::ZERO;
        for total in line_totals {
            sum = sum.safe_add(total)?;
        }
        self.money(sum.get())
    }

    fn money(&self, amount: Decimal) -> DomainResult<Price> {
        Price::new(self.round(amount))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::entities::reference::DiscountKind;

    fn price(s: &str) -> Price {
        s.parse().unwrap()
    }

    fn qty(n: u64) -> Quantity {
        Quantity::from_units(n).unwrap()
    }

    fn tier(id: &str, kind: DiscountKind, value: i64, min: i64) -> ProductDiscount {
        ProductDiscount::new(id, "p", kind, Decimal::new(value, 0), Decimal::new(min, 0)).unwrap()
    }

    mod basics {
        use super::*;

        #[test]
        fn plain_line_is_unit_times_quantity() {
            let calc = PricingCalculator::default();
            let line = calc
                .effective_price(price("12.50"), qty(4), None, &[], Timestamp::now())
                .unwrap();
            assert_eq!(line.gross, price("50"));
            assert_eq!(line.line_total, price("50"));
            assert!(line.applied_discount_id.is_none());
        }

        #[test]
        fn item_amount_discount_applies_to_whole_line() {
            let calc = PricingCalculator::default();
            let d = ItemDiscount::amount(price("5")).unwrap();
            let line = calc
                .effective_price(price("10"), qty(3), Some(&d), &[], Timestamp::now())
                .unwrap();
            assert_eq!(line.line_total, price("25"));
        }

        #[test]
        fn item_amount_above_gross_is_rejected() {
            let calc = PricingCalculator::default();
            let d = ItemDiscount::amount(price("31")).unwrap();
            assert!(
                calc.effective_price(price("10"), qty(3), Some(&d), &[], Timestamp::now())
                    .is_err()
            );
        }

        #[test]
        fn rounds_midpoint_away_from_zero() {
            let calc = PricingCalculator::default();
            let line = calc
                .effective_price(price("0.125"), qty(1), None, &[], Timestamp::now())
                .unwrap();
            assert_eq!(line.line_total, price("0.13"));
        }

        #[test]
        fn custom_scale() {
            let calc = PricingCalculator::new(0);
            let line = calc
                .effective_price(price("2.5"), qty(1), None, &[], Timestamp::now())
                .unwrap();
            assert_eq!(line.line_total, price("3"));
        }
    }

    mod tiers {
        use super::*;

        #[test]
        fn best_single_tier_wins() {
            let calc = PricingCalculator::default();
            let tiers = vec![
                tier("small", DiscountKind::Percentage, 5, 10),
                tier("big", DiscountKind::Percentage, 10, 50),
                tier("flat", DiscountKind::Amount, 30, 10),
            ];
            // gross 100 × 1 = 100 for qty 100: 10% = 10, flat = 30
            let line = calc
                .effective_price(price("1"), qty(100), None, &tiers, Timestamp::now())
                .unwrap();
            assert_eq!(line.applied_discount_id, Some("flat".into()));
            assert_eq!(line.line_total, price("70"));
        }

        #[test]
        fn tier_below_minimum_is_ignored() {
            let calc = PricingCalculator::default();
            let tiers = vec![tier("bulk", DiscountKind::Percentage, 20, 100)];
            let line = calc
                .effective_price(price("1"), qty(99), None, &tiers, Timestamp::now())
                .unwrap();
            assert!(line.applied_discount_id.is_none());
            assert_eq!(line.line_total, price("99"));
        }

        #[test]
        fn tier_applies_after_item_discount() {
            let calc = PricingCalculator::default();
            let d = ItemDiscount::percentage(Decimal::new(50, 0)).unwrap();
            let tiers = vec![tier("t", DiscountKind::Percentage, 10, 1)];
            let line = calc
                .effective_price(price("10"), qty(10), Some(&d), &tiers, Timestamp::now())
                .unwrap();
            // 100 → 50 → 45
            assert_eq!(line.line_total, price("45"));
        }

        #[test]
        fn total_never_negative() {
            let calc = PricingCalculator::default();
            let tiers = vec![tier("huge", DiscountKind::Amount, 1_000, 1)];
            let line = calc
                .effective_price(price("1"), qty(2), None, &tiers, Timestamp::now())
                .unwrap();
            assert_eq!(line.line_total, Price::ZERO);
        }

        #[test]
        fn equal_tiers_pick_lowest_id() {
            let calc = PricingCalculator::default();
            let tiers = vec![
                tier("b", DiscountKind::Percentage, 10, 1),
                tier("a", DiscountKind::Percentage, 10, 1),
            ];
            let line = calc
                .effective_price(price("10"), qty(1), None, &tiers, Timestamp::now())
                .unwrap();
            assert_eq!(line.applied_discount_id, Some("a".into()));
        }
    }

    #[test]
    fn effective_unit_price_and_grand_total() {
        let calc = PricingCalculator::default();
        assert_eq!(
            calc.effective_unit_price(price("100"), qty(3)).unwrap(),
            price("33.33")
        );
        assert_eq!(
            calc.grand_total([price("1.10"), price("2.20")]).unwrap(),
            price("3.30")
        );
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn line_total_within_zero_and_gross(
                unit_cents in 0i64..1_000_000,
                units in 1u64..10_000,
                pct in 1i64..=100,
                tier_value in 1i64..500,
                tier_min in 0i64..10_000,
            ) {
                let calc = PricingCalculator::default();
                let unit = Price::new(Decimal::new(unit_cents, 2)).unwrap();
                let discount = ItemDiscount::percentage(Decimal::new(pct, 0)).unwrap();
                let tiers = vec![tier("t", DiscountKind::Amount, tier_value, tier_min)];
                let line = calc
                    .effective_price(unit, qty(units), Some(&discount), &tiers, Timestamp::now())
                    .unwrap();
                prop_assert!(line.line_total.get() >= Decimal::ZERO);
                prop_assert!(line.line_total <= line.gross);
            }

            #[test]
            fn tiers_never_raise_the_price(
                unit_cents in 1i64..100_000,
                units in 1u64..1_000,
                pct in 1i64..=100,
            ) {
                let calc = PricingCalculator::default();
                let unit = Price::new(Decimal::new(unit_cents, 2)).unwrap();
                let tiers = vec![tier("t", DiscountKind::Percentage, pct, 1)];
                let plain = calc.effective_price(unit, qty(units), None, &[], Timestamp::now()).unwrap();
                let tiered = calc.effective_price(unit, qty(units), None, &tiers, Timestamp::now()).unwrap();
                prop_assert!(tiered.line_total <= plain.line_total);
            }
        }
    }
}
