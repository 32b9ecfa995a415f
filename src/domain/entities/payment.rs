//! # Payment Aggregate Root
//!
//! Settlement record for one order. An accepted quotation becomes an order
//! carrying the quotation's UUID; orders created outside the RFQ flow bring
//! their own IDs.
//!
//! # State Machine
//!
//! ```text
//! Pending → Processing → Completed → Refunded
//!    │          │
//!    └──────────┴→ Failed
//! ```
//!
//! `Pending → Completed` is allowed directly. Payments are never deleted.

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::timestamp::Timestamp;
use crate::domain::value_objects::{CompanyId, OrderId, PaymentId, PaymentStatus, Price};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payment aggregate root.
///
/// # Invariants
///
/// - `amount` is positive
/// - `0 < refund_amount <= amount` once refunded
/// - Status changes follow [`PaymentStatus::can_transition_to`]
///
/// # Examples
///
/// ```
/// use procurement_engine::domain::entities::payment::Payment;
/// use procurement_engine::domain::value_objects::{CompanyId, OrderId, PaymentStatus, Price};
///
/// let mut payment = Payment::new(
///     OrderId::new_v4(),
///     CompanyId::new("acme"),
///     "250.00".parse::<Price>().unwrap(),
///     "EUR",
/// ).unwrap();
///
/// payment.confirm("txn-1").unwrap();
/// assert_eq!(payment.status(), PaymentStatus::Completed);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    id: PaymentId,
    order_id: OrderId,
    company_id: CompanyId,
    amount: Price,
    currency: String,
    status: PaymentStatus,
    transaction_id: Option<String>,
    failure_reason: Option<String>,
    refund_amount: Option<Price>,
    refund_reason: Option<String>,
    /// Version for optimistic locking.
    version: u64,
    created_at: Timestamp,
    updated_at: Timestamp,
    processing_at: Option<Timestamp>,
    completed_at: Option<Timestamp>,
    failed_at: Option<Timestamp>,
    refunded_at: Option<Timestamp>,
}

impl Payment {
    /// Creates a pending payment.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the amount is zero or the
    /// currency code is blank.
    pub fn new(
        order_id: OrderId,
        company_id: CompanyId,
        amount: Price,
        currency: impl Into<String>,
    ) -> DomainResult<Self> {
        if !amount.is_positive() {
            return Err(DomainError::validation(format!(
                "payment amount must be positive, got {amount}"
            )));
        }
        let currency = currency.into().trim().to_uppercase();
        if currency.is_empty() {
            return Err(DomainError::validation("currency must not be empty"));
        }

        let now = Timestamp::now();
        Ok(Self {
            id: PaymentId::new_v4(),
            order_id,
            company_id,
            amount,
            currency,
            status: PaymentStatus::Pending,
            transaction_id: None,
            failure_reason: None,
            refund_amount: None,
            refund_reason: None,
            version: 1,
            created_at: now,
            updated_at: now,
            processing_at: None,
            completed_at: None,
            failed_at: None,
            refunded_at: None,
        })
    }

    fn transition_to(&mut self, target: PaymentStatus) -> DomainResult<()> {
        if !self.status.can_transition_to(target) {
            return Err(DomainError::transition("Payment", self.status, target));
        }
        self.status = target;
        self.updated_at = Timestamp::now();
        self.version = self.version.saturating_add(1);
        Ok(())
    }

    /// Returns the payment ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> PaymentId {
        self.id
    }

    /// Returns the settled order.
    #[inline]
    #[must_use]
    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    /// Returns the paying company.
    #[inline]
    #[must_use]
    pub fn company_id(&self) -> &CompanyId {
        &self.company_id
    }

    /// Returns the amount due.
    #[inline]
    #[must_use]
    pub fn amount(&self) -> Price {
        self.amount
    }

    /// Returns the ISO currency code.
    #[inline]
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Returns the lifecycle status.
    #[inline]
    #[must_use]
    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    /// Returns the provider transaction reference.
    #[inline]
    #[must_use]
    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    /// Returns why the payment failed.
    #[inline]
    #[must_use]
    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    /// Returns the refunded amount.
    #[inline]
    #[must_use]
    pub fn refund_amount(&self) -> Option<Price> {
        self.refund_amount
    }

    /// Returns the refund reason.
    #[inline]
    #[must_use]
    pub fn refund_reason(&self) -> Option<&str> {
        self.refund_reason.as_deref()
    }

    /// Returns the version for optimistic locking.
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns when the payment was created.
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Returns when the payment was last updated.
    #[inline]
    #[must_use]
    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Returns when processing started.
    #[inline]
    #[must_use]
    pub fn processing_at(&self) -> Option<Timestamp> {
        self.processing_at
    }

    /// Returns when the payment completed.
    #[inline]
    #[must_use]
    pub fn completed_at(&self) -> Option<Timestamp> {
        self.completed_at
    }

    /// Returns when the payment failed.
    #[inline]
    #[must_use]
    pub fn failed_at(&self) -> Option<Timestamp> {
        self.failed_at
    }

    /// Returns when the payment was refunded.
    #[inline]
    #[must_use]
    pub fn refunded_at(&self) -> Option<Timestamp> {
        self.refunded_at
    }

    /// Hands the payment to the provider.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStateTransition` unless pending.
    pub fn mark_processing(&mut self, transaction_id: impl Into<String>) -> DomainResult<()> {
        self.transition_to(PaymentStatus::Processing)?;
        self.transaction_id = Some(transaction_id.into());
        self.processing_at = Some(self.updated_at);
        Ok(())
    }

    /// Confirms settlement.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStateTransition` unless pending or processing.
    pub fn confirm(&mut self, transaction_id: impl Into<String>) -> DomainResult<()> {
        self.transition_to(PaymentStatus::Completed)?;
        self.transaction_id = Some(transaction_id.into());
        self.completed_at = Some(self.updated_at);
        Ok(())
    }

    /// Records a settlement failure.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStateTransition` once completed,
    /// refunded or already failed.
    pub fn fail(&mut self, reason: impl Into<String>) -> DomainResult<()> {
        self.transition_to(PaymentStatus::Failed)?;
        self.failure_reason = Some(reason.into());
        self.failed_at = Some(self.updated_at);
        Ok(())
    }

    /// Refunds a completed payment, fully or partially.
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidState` unless completed
    /// - `DomainError::Validation` unless `0 < amount <= self.amount()`
    pub fn refund(&mut self, amount: Price, reason: impl Into<String>) -> DomainResult<()> {
        if self.status != PaymentStatus::Completed {
            return Err(DomainError::invalid_state(format!(
                "payment {} is {} and cannot be refunded",
                self.id, self.status
            )));
        }
        if !amount.is_positive() || amount > self.amount {
            return Err(DomainError::validation(format!(
                "refund amount must be in (0, {}], got {amount}",
                self.amount
            )));
        }
        self.transition_to(PaymentStatus::Refunded)?;
        self.refund_amount = Some(amount);
        self.refund_reason = Some(reason.into());
        self.refunded_at = Some(self.updated_at);
        Ok(())
    }

    /// Returns true if only part of the amount was refunded.
    #[must_use]
    pub fn is_partially_refunded(&self) -> bool {
        self.refund_amount.is_some_and(|r| r < self.amount)
    }
}

impl fmt::Display for Payment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Payment({} order={} {} {} [{}])",
            self.id, self.order_id, self.amount, self.currency, self.status
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pending() -> Payment {
        Payment::new(
            OrderId::new_v4(),
            CompanyId::new("acme"),
            "100".parse().unwrap(),
            "eur",
        )
        .unwrap()
    }

    fn completed() -> Payment {
        let mut p = pending();
        p.confirm("txn").unwrap();
        p
    }

    #[test]
    fn new_payment_is_pending() {
        let p = pending();
        assert_eq!(p.status(), PaymentStatus::Pending);
        assert_eq!(p.currency(), "EUR");
        assert_eq!(p.version(), 1);
    }

    #[test]
    fn zero_amount_rejected() {
        let result = Payment::new(OrderId::new_v4(), CompanyId::new("a"), Price::ZERO, "EUR");
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn processing_then_completed() {
        let mut p = pending();
        p.mark_processing("txn-9").unwrap();
        assert_eq!(p.transaction_id(), Some("txn-9"));
        p.confirm("txn-9").unwrap();
        assert!(p.completed_at().is_some());
        assert!(p.mark_processing("x").is_err());
    }

    #[test]
    fn fail_only_while_open() {
        let mut p = pending();
        p.fail("card declined").unwrap();
        assert!(p.fail("again").unwrap_err().is_state_error());
        assert!(p.confirm("late").is_err());

        let mut p = completed();
        assert!(p.fail("late").unwrap_err().is_state_error());
    }

    #[test]
    fn refund_requires_completed() {
        let mut p = pending();
        assert!(matches!(
            p.refund("10".parse().unwrap(), "r"),
            Err(DomainError::InvalidState(_))
        ));
    }

    #[test]
    fn refund_amount_bounds() {
        let mut p = completed();
        assert!(matches!(
            p.refund(Price::ZERO, "r"),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            p.refund("100.01".parse().unwrap(), "r"),
            Err(DomainError::Validation(_))
        ));
        assert_eq!(p.status(), PaymentStatus::Completed);
    }

    #[test]
    fn partial_refund_ends_refunded() {
        let mut p = completed();
        p.refund("40".parse().unwrap(), "damaged goods").unwrap();
        assert_eq!(p.status(), PaymentStatus::Refunded);
        assert!(p.is_partially_refunded());
        assert_eq!(p.refund_reason(), Some("damaged goods"));
    }

    #[test]
    fn refund_twice_is_invalid_state() {
        let mut p = completed();
        p.refund("100".parse().unwrap(), "r").unwrap();
        assert!(!p.is_partially_refunded());
        assert!(matches!(
            p.refund("1".parse().unwrap(), "r"),
            Err(DomainError::InvalidState(_))
        ));
    }
}
