//! # Ranking Strategy
//!
//! Strategies for ranking submitted quotations of one RFQ.
//!
//! This module provides the [`RankingStrategy`] trait and the
//! [`LowestTotalStrategy`] used by the comparison engine.

use crate::domain::entities::quotation::Quotation;
use crate::domain::value_objects::timestamp::Timestamp;
use crate::domain::value_objects::{Price, QuotationId, QuotationStatus, SupplierId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Decimal places kept on normalized scores.
pub const SCORE_SCALE: u32 = 4;

/// A quotation with its ranking information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedQuotation {
    /// Ranked row.
    pub quotation_id: QuotationId,
    /// Quoting supplier.
    pub supplier_id: SupplierId,
    /// Version number within the supplier's chain.
    pub version_number: u32,
    /// Lifecycle status at comparison time.
    pub status: QuotationStatus,
    /// Frozen grand total.
    pub grand_total: Price,
    /// Submission instant.
    pub submitted_at: Option<Timestamp>,
    /// The rank (1 = best).
    pub rank: usize,
    /// Lowest total divided by this total, in `(0, 1]`.
    pub score: Decimal,
}

impl RankedQuotation {
    /// Returns true if this quotation is the best (rank 1).
    #[must_use]
    pub fn is_best(&self) -> bool {
        self.rank == 1
    }
}

impl fmt::Display for RankedQuotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} v{} total={} score={}",
            self.rank, self.supplier_id, self.version_number, self.grand_total, self.score
        )
    }
}

/// Trait for ranking strategies.
///
/// Implementations order quotations best first and attach a score.
pub trait RankingStrategy: Send + Sync + fmt::Debug {
    /// Ranks the given quotations, best first.
    fn rank(&self, quotations: &[&Quotation]) -> Vec<RankedQuotation>;

    /// Returns the name of this ranking strategy.
    fn name(&self) -> &'static str;
}

/// Lowest grand total wins.
///
/// Ties go to the earlier submission, then to the smaller quotation ID.
/// The score is the lowest total divided by the quotation's total.
#[derive(Debug, Clone, Copy, Default)]
pub struct LowestTotalStrategy;

impl LowestTotalStrategy {
    /// Creates the strategy.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn order(a: &Quotation, b: &Quotation) -> Ordering {
        a.grand_total()
            .cmp(&b.grand_total())
            .then_with(|| compare_submission(a.submitted_at(), b.submitted_at()))
            .then_with(|| a.id().cmp(&b.id()))
    }
}

// Unsubmitted rows sort after submitted ones.
fn compare_submission(a: Option<Timestamp>, b: Option<Timestamp>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Returns `lowest / total` rounded to [`SCORE_SCALE`] places.
#[must_use]
pub fn normalized_score(lowest: Price, total: Price) -> Decimal {
    if total.is_zero() {
        return Decimal::ONE;
    }
    lowest
        .get()
        .checked_div(total.get())
        .map_or(Decimal::ZERO, |s| s.round_dp(SCORE_SCALE))
}

impl RankingStrategy for LowestTotalStrategy {
    fn rank(&self, quotations: &[&Quotation]) -> Vec<RankedQuotation> {
        let mut sorted: Vec<&Quotation> = quotations.to_vec();
        sorted.sort_by(|a, b| Self::order(a, b));

        let Some(lowest) = sorted.first().map(|q| q.grand_total()) else {
            return Vec::new();
        };

        sorted
            .into_iter()
            .enumerate()
            .map(|(i, q)| RankedQuotation {
                quotation_id: q.id(),
                supplier_id: q.supplier_id().clone(),
                version_number: q.version_number(),
                status: q.status(),
                grand_total: q.grand_total(),
                submitted_at: q.submitted_at(),
                rank: i + 1,
                score: normalized_score(lowest, q.grand_total()),
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "LowestTotal"
    }
}
