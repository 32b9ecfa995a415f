//! # Payment Lifecycle Service
//!
//! Settlement of orders, one payment per order.
//!
//! ```text
//! PENDING ──► PROCESSING ──► COMPLETED ──► REFUNDED
//!    │            │              ▲
//!    │            └──► FAILED    │
//!    ├──► FAILED                 │
//!    └───────────────────────────┘
//! ```

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::events::EventPublisher;
use crate::domain::entities::Payment;
use crate::domain::errors::DomainResult;
use crate::domain::events::{PaymentChange, PaymentEvent};
use crate::domain::value_objects::{CompanyId, OrderId, PaymentId, Price};
use crate::infrastructure::persistence::PaymentRepository;
use std::sync::Arc;
use tracing::{info, instrument};

/// Payment lifecycle manager.
#[derive(Debug, Clone)]
pub struct PaymentService {
    payments: Arc<dyn PaymentRepository>,
    events: EventPublisher,
    default_currency: String,
}

impl PaymentService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        events: EventPublisher,
        default_currency: impl Into<String>,
    ) -> Self {
        Self {
            payments,
            events,
            default_currency: default_currency.into(),
        }
    }

    async fn load(&self, id: PaymentId) -> ApplicationResult<Payment> {
        self.payments
            .get(&id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Payment", id))
    }

    async fn mutate<F>(&self, id: PaymentId, change: F) -> ApplicationResult<Payment>
    where
        F: FnOnce(&mut Payment) -> DomainResult<()> + Send,
    {
        let mut payment = self.load(id).await?;
        let expected = payment.version();
        change(&mut payment)?;
        self.payments.update(&payment, expected).await?;
        Ok(payment)
    }

    /// Opens a PENDING payment for an order.
    ///
    /// `currency` falls back to the configured default.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the order already has a payment
    /// - `Validation` for a zero amount or blank currency
    #[instrument(skip(self), fields(order_id = %order_id, company_id = %company_id))]
    pub async fn create(
        &self,
        order_id: OrderId,
        company_id: CompanyId,
        amount: Price,
        currency: Option<&str>,
    ) -> ApplicationResult<Payment> {
        if self.payments.get_by_order(&order_id).await?.is_some() {
            return Err(ApplicationError::conflict(format!(
                "order {order_id} already has a payment"
            )));
        }
        let currency = currency.unwrap_or(&self.default_currency);
        let payment = Payment::new(order_id, company_id, amount, currency)?;
        self.payments.insert(&payment).await?;
        info!(payment_id = %payment.id(), %amount, "payment created");
        self.events
            .publish(PaymentEvent::new(
                payment.id(),
                PaymentChange::Created {
                    order_id,
                    amount,
                    currency: payment.currency().to_string(),
                },
            ))
            .await;
        Ok(payment)
    }

    /// Hands a pending payment to the provider.
    ///
    /// # Errors
    ///
    /// `NotFound`, or `InvalidState` unless pending.
    #[instrument(skip(self, transaction_id), fields(payment_id = %id))]
    pub async fn mark_processing(
        &self,
        id: PaymentId,
        transaction_id: impl Into<String>,
    ) -> ApplicationResult<Payment> {
        let transaction_id = transaction_id.into();
        let payment = self
            .mutate(id, |p| p.mark_processing(transaction_id.clone()))
            .await?;
        info!(%transaction_id, "payment processing");
        self.events
            .publish(PaymentEvent::new(id, PaymentChange::Processing { transaction_id }))
            .await;
        Ok(payment)
    }

    /// Confirms settlement.
    ///
    /// # Errors
    ///
    /// `NotFound`, or `InvalidState` unless pending or processing.
    #[instrument(skip(self, transaction_id), fields(payment_id = %id))]
    pub async fn confirm(
        &self,
        id: PaymentId,
        transaction_id: impl Into<String>,
    ) -> ApplicationResult<Payment> {
        let transaction_id = transaction_id.into();
        let payment = self.mutate(id, |p| p.confirm(transaction_id.clone())).await?;
        info!(%transaction_id, "payment completed");
        self.events
            .publish(PaymentEvent::new(id, PaymentChange::Completed { transaction_id }))
            .await;
        Ok(payment)
    }

    /// Records a settlement failure.
    ///
    /// # Errors
    ///
    /// `NotFound`, or `InvalidState` once completed, refunded or failed.
    #[instrument(skip(self, reason), fields(payment_id = %id))]
    pub async fn fail(&self, id: PaymentId, reason: impl Into<String>) -> ApplicationResult<Payment> {
        let reason = reason.into();
        let payment = self.mutate(id, |p| p.fail(reason.clone())).await?;
        info!(%reason, "payment failed");
        self.events
            .publish(PaymentEvent::new(id, PaymentChange::Failed { reason }))
            .await;
        Ok(payment)
    }

    /// Refunds a completed payment, fully or partially.
    ///
    /// # Errors
    ///
    /// `NotFound`, `InvalidState` unless completed, `Validation` unless
    /// `0 < amount <= payment amount`.
    #[instrument(skip(self, reason), fields(payment_id = %id, %amount))]
    pub async fn refund(
        &self,
        id: PaymentId,
        amount: Price,
        reason: impl Into<String>,
    ) -> ApplicationResult<Payment> {
        let reason = reason.into();
        let payment = self.mutate(id, |p| p.refund(amount, reason.clone())).await?;
        info!(partial = payment.is_partially_refunded(), "payment refunded");
        self.events
            .publish(PaymentEvent::new(id, PaymentChange::Refunded { amount, reason }))
            .await;
        Ok(payment)
    }

    /// Gets a payment.
    ///
    /// # Errors
    ///
    /// `NotFound` if unknown.
    #[instrument(skip(self), fields(payment_id = %id))]
    pub async fn get(&self, id: PaymentId) -> ApplicationResult<Payment> {
        self.load(id).await
    }

    /// Gets the payment settling an order.
    ///
    /// # Errors
    ///
    /// `NotFound` if the order has no payment.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_by_order(&self, order_id: OrderId) -> ApplicationResult<Payment> {
        self.payments
            .get_by_order(&order_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Payment for order", order_id))
    }

    /// Lists a company's payments, oldest first.
    ///
    /// # Errors
    ///
    /// `Infrastructure` on storage failure.
    #[instrument(skip(self), fields(company_id = %company_id))]
    pub async fn list(&self, company_id: &CompanyId) -> ApplicationResult<Vec<Payment>> {
        Ok(self.payments.find_by_company(company_id).await?)
    }
}
