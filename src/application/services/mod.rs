//! # Application Services
//!
//! Services that orchestrate domain logic and infrastructure.
//!
//! This module provides application-level services including:
//! - [`RfqService`]: RFQ documents, items and invitations
//! - [`QuotationService`]: Quotation drafting, review, acceptance and versions
//! - [`PaymentService`]: Payment settlement and refunds
//! - [`ComparisonEngine`]: Ranked comparison of submitted quotations
//! - [`RankingStrategy`]: Strategies for ranking quotations

pub mod comparison;
pub mod events;
pub mod payment_service;
pub mod quotation_service;
pub mod ranking_strategy;
pub mod retry;
pub mod rfq_service;

pub use comparison::{ComparisonEngine, ComparisonTable, ItemComparison, ItemOffer};
pub use events::EventPublisher;
pub use payment_service::PaymentService;
pub use quotation_service::QuotationService;
pub use ranking_strategy::{LowestTotalStrategy, RankedQuotation, RankingStrategy};
pub use retry::RetryPolicy;
pub use rfq_service::RfqService;
