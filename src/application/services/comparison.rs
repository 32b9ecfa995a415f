//! # Comparison Engine
//!
//! Read-side derivation of a ranked, per-line comparison across every
//! non-draft quotation of an RFQ.
//!
//! Tables are recomputed on each request from the frozen line totals of
//! the quotations and never cached.
//!
//! # Examples
//!
//! ```
//! use procurement_engine::application::services::{ComparisonEngine, LowestTotalStrategy};
//! use procurement_engine::domain::entities::rfq::{Rfq, RfqItemSpec};
//! use procurement_engine::domain::services::PricingCalculator;
//! use procurement_engine::domain::value_objects::{CompanyId, Quantity, RfqType};
//!
//! let mut rfq = Rfq::new(CompanyId::new("acme"), "Pens", "", RfqType::Open, None).unwrap();
//! rfq.add_item(RfqItemSpec::new("office", Quantity::from_units(10).unwrap(), "box")).unwrap();
//!
//! let calculator = PricingCalculator::default();
//! let table = ComparisonEngine::build_table(&calculator, &LowestTotalStrategy::new(), &rfq, &[]).unwrap();
//! assert!(table.quotations.is_empty());
//! assert_eq!(table.items.len(), 1);
//! ```

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::ranking_strategy::{
    LowestTotalStrategy, RankedQuotation, RankingStrategy,
};
use crate::domain::entities::quotation::Quotation;
use crate::domain::entities::rfq::Rfq;
use crate::domain::errors::DomainResult;
use crate::domain::services::PricingCalculator;
use crate::domain::value_objects::timestamp::Timestamp;
use crate::domain::value_objects::{
    CategoryId, DiscountId, ItemDiscount, Price, Quantity, QuotationId, QuotationStatus, RfqId,
    RfqItemId, SupplierId,
};
use crate::infrastructure::persistence::{QuotationFilter, QuotationRepository, RfqRepository};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

/// One supplier's offer on one RFQ line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemOffer {
    /// Offering quotation row.
    pub quotation_id: QuotationId,
    /// Offering supplier.
    pub supplier_id: SupplierId,
    /// Version number of the offering row.
    pub version_number: u32,
    /// Quoted unit price before discounts.
    pub unit_price: Price,
    /// Quoted quantity.
    pub quantity: Quantity,
    /// Line-level discount set by the supplier.
    pub item_discount: Option<ItemDiscount>,
    /// Product tier applied when the line was priced.
    pub applied_discount_id: Option<DiscountId>,
    /// Line total after discounts.
    pub line_total: Price,
    /// Line total divided by quantity.
    pub effective_unit_price: Price,
    /// False when the effective unit price exceeds the RFQ target.
    pub within_target: bool,
}

/// All offers on one RFQ line, cheapest effective unit price first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemComparison {
    /// RFQ line.
    pub rfq_item_id: RfqItemId,
    /// Category of the line.
    pub category_id: CategoryId,
    /// Requested quantity.
    pub requested_quantity: Quantity,
    /// Target unit price.
    pub target_price: Option<Price>,
    /// Offers, sorted.
    pub offers: Vec<ItemOffer>,
}

impl ItemComparison {
    /// Returns the lowest offer, if any supplier quoted the line.
    #[must_use]
    pub fn lowest_offer(&self) -> Option<&ItemOffer> {
        self.offers.first()
    }
}

/// Ranked comparison of an RFQ's quotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonTable {
    /// Compared RFQ.
    pub rfq_id: RfqId,
    /// Name of the ranking strategy.
    pub strategy: String,
    /// Quotations, best first.
    pub quotations: Vec<RankedQuotation>,
    /// Per-line breakdown in RFQ item order.
    pub items: Vec<ItemComparison>,
    /// When the table was derived.
    pub generated_at: Timestamp,
}

impl ComparisonTable {
    /// Returns the best ranked quotation.
    #[must_use]
    pub fn best(&self) -> Option<&RankedQuotation> {
        self.quotations.first()
    }

    /// Returns the breakdown of one RFQ line.
    #[must_use]
    pub fn item(&self, rfq_item_id: RfqItemId) -> Option<&ItemComparison> {
        self.items.iter().find(|i| i.rfq_item_id == rfq_item_id)
    }
}

/// Builds comparison tables from stored RFQs and quotations.
#[derive(Debug, Clone)]
pub struct ComparisonEngine {
    rfqs: Arc<dyn RfqRepository>,
    quotations: Arc<dyn QuotationRepository>,
    calculator: PricingCalculator,
    strategy: Arc<dyn RankingStrategy>,
}

impl ComparisonEngine {
    /// Creates an engine ranking by lowest total.
    #[must_use]
    pub fn new(
        rfqs: Arc<dyn RfqRepository>,
        quotations: Arc<dyn QuotationRepository>,
        calculator: PricingCalculator,
    ) -> Self {
        Self {
            rfqs,
            quotations,
            calculator,
            strategy: Arc::new(LowestTotalStrategy::new()),
        }
    }

    /// Replaces the ranking strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: Arc<dyn RankingStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Compares every non-draft quotation of an RFQ.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown RFQ, `Infrastructure` on storage failure.
    #[instrument(skip(self), fields(rfq_id = %rfq_id, strategy = self.strategy.name()))]
    pub async fn compare(&self, rfq_id: RfqId) -> ApplicationResult<ComparisonTable> {
        let rfq = self
            .rfqs
            .get(&rfq_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("RFQ", rfq_id))?;
        let filter = QuotationFilter {
            rfq_id: Some(rfq_id),
            ..QuotationFilter::default()
        };
        let quotations = self.quotations.list(&filter).await?;
        let table = Self::build_table(&self.calculator, self.strategy.as_ref(), &rfq, &quotations)?;
        debug!(
            quotations = table.quotations.len(),
            best = ?table.best().map(|b| b.quotation_id),
            "comparison built"
        );
        Ok(table)
    }

    /// Derives a table from already loaded rows. Draft rows are skipped.
    ///
    /// # Errors
    ///
    /// Returns an arithmetic error if an effective unit price overflows.
    pub fn build_table<S>(
        calculator: &PricingCalculator,
        strategy: &S,
        rfq: &Rfq,
        quotations: &[Quotation],
    ) -> DomainResult<ComparisonTable>
    where
        S: RankingStrategy + ?Sized,
    {
        let compared: Vec<&Quotation> = quotations
            .iter()
            .filter(|q| q.rfq_id() == rfq.id() && q.status() != QuotationStatus::Draft)
            .collect();
        let ranked = strategy.rank(&compared);

        let mut items = Vec::with_capacity(rfq.items().len());
        for rfq_item in rfq.items() {
            let mut offers = Vec::new();
            for q in &compared {
                let Some(line) = q.item_for(rfq_item.id()) else {
                    continue;
                };
                let effective_unit_price =
                    calculator.effective_unit_price(line.line_total(), line.quantity())?;
                offers.push(ItemOffer {
                    quotation_id: q.id(),
                    supplier_id: q.supplier_id().clone(),
                    version_number: q.version_number(),
                    unit_price: line.unit_price(),
                    quantity: line.quantity(),
                    item_discount: line.discount().copied(),
                    applied_discount_id: line.applied_discount_id().cloned(),
                    line_total: line.line_total(),
                    effective_unit_price,
                    within_target: rfq_item
                        .target_price()
                        .map_or(true, |target| effective_unit_price <= target),
                });
            }
            offers.sort_by(|a, b| {
                a.effective_unit_price
                    .cmp(&b.effective_unit_price)
                    .then_with(|| a.line_total.cmp(&b.line_total))
                    .then_with(|| a.quotation_id.cmp(&b.quotation_id))
            });
            items.push(ItemComparison {
                rfq_item_id: rfq_item.id(),
                category_id: rfq_item.category_id().clone(),
                requested_quantity: rfq_item.quantity(),
                target_price: rfq_item.target_price(),
                offers,
            });
        }

        Ok(ComparisonTable {
            rfq_id: rfq.id(),
            strategy: strategy.name().to_string(),
            quotations: ranked,
            items,
            generated_at: Timestamp::now(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::domain::entities::quotation::QuotationItemSpec;
    use crate::domain::entities::rfq::RfqItemSpec;
    use crate::domain::value_objects::{CompanyId, RfqType};
    use crate::infrastructure::persistence::in_memory::{
        InMemoryQuotationRepository, InMemoryRfqRepository,
    };
    use rust_decimal::Decimal;
    use std::collections::HashMap;

    fn price(v: i64) -> Price {
        Price::new(Decimal::new(v, 0)).unwrap()
    }

    fn rfq_with_two_lines() -> Rfq {
        let mut rfq = Rfq::new(CompanyId::new("acme"), "Office", "", RfqType::Open, None).unwrap();
        rfq.add_item(
            RfqItemSpec::new("pens", Quantity::from_units(10).unwrap(), "box")
                .with_target_price(price(9)),
        )
        .unwrap();
        rfq.add_item(RfqItemSpec::new("paper", Quantity::from_units(5).unwrap(), "ream"))
            .unwrap();
        rfq.publish().unwrap();
        rfq
    }

    fn quotation(rfq: &Rfq, supplier: &str, units: &[i64], submit: bool) -> Quotation {
        let calc = PricingCalculator::default();
        let mut q = Quotation::start(rfq, SupplierId::new(supplier), "").unwrap();
        for (item, unit) in rfq.items().iter().zip(units) {
            let spec = QuotationItemSpec::new(item.id(), price(*unit), item.quantity());
            q.add_item(rfq, spec, None, &calc, &[]).unwrap();
        }
        if submit {
            q.submit(rfq, &calc, &HashMap::new()).unwrap();
        }
        q
    }

    #[test]
    fn drafts_are_excluded() {
        let rfq = rfq_with_two_lines();
        let q1 = quotation(&rfq, "s-1", &[10, 4], true);
        let q2 = quotation(&rfq, "s-2", &[8, 5], true);
        let draft = quotation(&rfq, "s-3", &[1, 1], false);

        let table = ComparisonEngine::build_table(
            &PricingCalculator::default(),
            &LowestTotalStrategy::new(),
            &rfq,
            &[q1.clone(), q2.clone(), draft.clone()],
        )
        .unwrap();

        assert_eq!(table.quotations.len(), 2);
        assert!(table.quotations.iter().all(|r| r.quotation_id != draft.id()));
        // q1 = 100 + 20, q2 = 80 + 25
        assert_eq!(table.best().unwrap().quotation_id, q2.id());
        assert_eq!(table.strategy, "LowestTotal");
    }

    #[test]
    fn lowest_offer_per_line() {
        let rfq = rfq_with_two_lines();
        let q1 = quotation(&rfq, "s-1", &[10, 4], true);
        let q2 = quotation(&rfq, "s-2", &[8, 5], true);
        let table = ComparisonEngine::build_table(
            &PricingCalculator::default(),
            &LowestTotalStrategy::new(),
            &rfq,
            &[q1.clone(), q2.clone()],
        )
        .unwrap();

        let pens = &table.items[0];
        assert_eq!(pens.lowest_offer().unwrap().quotation_id, q2.id());
        assert!(pens.lowest_offer().unwrap().within_target);
        assert!(!pens.offers[1].within_target);

        let paper = table.item(rfq.items()[1].id()).unwrap();
        assert_eq!(paper.lowest_offer().unwrap().quotation_id, q1.id());
        assert!(paper.offers.iter().all(|o| o.within_target));
    }

    #[test]
    fn unquoted_lines_have_no_offers() {
        let rfq = rfq_with_two_lines();
        let q = quotation(&rfq, "s-1", &[10], true);
        let table = ComparisonEngine::build_table(
            &PricingCalculator::default(),
            &LowestTotalStrategy::new(),
            &rfq,
            &[q],
        )
        .unwrap();
        assert_eq!(table.items[0].offers.len(), 1);
        assert!(table.items[1].lowest_offer().is_none());
    }

    #[tokio::test]
    async fn compare_reads_from_repositories() {
        let rfqs = Arc::new(InMemoryRfqRepository::new());
        let quotations = Arc::new(InMemoryQuotationRepository::new());
        let rfq = rfq_with_two_lines();
        rfqs.insert(&rfq).await.unwrap();
        let q = quotation(&rfq, "s-1", &[10, 4], true);
        quotations.insert(&q).await.unwrap();

        let engine = ComparisonEngine::new(rfqs, quotations, PricingCalculator::default());
        let table = engine.compare(rfq.id()).await.unwrap();
        assert_eq!(table.quotations.len(), 1);
        assert_eq!(table.quotations[0].grand_total, price(120));

        let err = engine.compare(RfqId::new_v4()).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
