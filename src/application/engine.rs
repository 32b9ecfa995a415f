//! # Procurement Engine
//!
//! Wires the lifecycle services and the comparison engine over one set of
//! ports.
//!
//! # Examples
//!
//! ```
//! use procurement_engine::application::ProcurementEngine;
//! use procurement_engine::config::EngineConfig;
//! use procurement_engine::infrastructure::reference_data::InMemoryReferenceData;
//! use std::sync::Arc;
//!
//! let engine = ProcurementEngine::in_memory(&EngineConfig::default(), Arc::new(InMemoryReferenceData::new()));
//! assert_eq!(engine.quotations().calculator().money_scale(), 2);
//! ```

use crate::application::services::{
    ComparisonEngine, EventPublisher, PaymentService, QuotationService, RetryPolicy, RfqService,
};
use crate::config::EngineConfig;
use crate::domain::services::PricingCalculator;
use crate::infrastructure::persistence::in_memory::{
    InMemoryAcceptanceUnit, InMemoryEventStore, InMemoryPaymentRepository,
    InMemoryQuotationRepository, InMemoryRfqDeletionUnit, InMemoryRfqRepository,
};
use crate::infrastructure::persistence::postgres::{
    PostgresAcceptanceUnit, PostgresEventStore, PostgresPaymentRepository,
    PostgresQuotationRepository, PostgresRfqDeletionUnit, PostgresRfqRepository,
};
use crate::infrastructure::persistence::{
    AcceptanceUnitOfWork, EventStore, PaymentRepository, QuotationRepository, RfqDeletionUnit,
    RfqRepository,
};
use crate::infrastructure::reference_data::ReferenceDataGateway;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

/// The ports an engine runs on.
#[derive(Debug, Clone)]
pub struct EnginePorts {
    /// RFQ storage.
    pub rfqs: Arc<dyn RfqRepository>,
    /// Quotation storage.
    pub quotations: Arc<dyn QuotationRepository>,
    /// Payment storage.
    pub payments: Arc<dyn PaymentRepository>,
    /// Atomic acceptance write, sharing storage with the two above.
    pub acceptance: Arc<dyn AcceptanceUnitOfWork>,
    /// Atomic RFQ deletion, sharing storage with the RFQ and quotation stores.
    pub deletion: Arc<dyn RfqDeletionUnit>,
    /// Catalog lookups.
    pub reference: Arc<dyn ReferenceDataGateway>,
    /// Domain event sink.
    pub events: Arc<dyn EventStore>,
}

impl EnginePorts {
    /// In-memory storage and event store over the given catalog.
    #[must_use]
    pub fn in_memory(reference: Arc<dyn ReferenceDataGateway>) -> Self {
        let rfqs = InMemoryRfqRepository::new();
        let quotations = InMemoryQuotationRepository::referencing(&rfqs);
        let payments = InMemoryPaymentRepository::new();
        let acceptance = InMemoryAcceptanceUnit::new(&quotations, &payments);
        let deletion = InMemoryRfqDeletionUnit::new(&rfqs, &quotations);
        Self {
            rfqs: Arc::new(rfqs),
            quotations: Arc::new(quotations),
            payments: Arc::new(payments),
            acceptance: Arc::new(acceptance),
            deletion: Arc::new(deletion),
            reference,
            events: Arc::new(InMemoryEventStore::new()),
        }
    }

    /// PostgreSQL storage and event store on one pool.
    #[must_use]
    pub fn postgres(pool: &PgPool, reference: Arc<dyn ReferenceDataGateway>) -> Self {
        Self {
            rfqs: Arc::new(PostgresRfqRepository::new(pool.clone())),
            quotations: Arc::new(PostgresQuotationRepository::new(pool.clone())),
            payments: Arc::new(PostgresPaymentRepository::new(pool.clone())),
            acceptance: Arc::new(PostgresAcceptanceUnit::new(pool.clone())),
            deletion: Arc::new(PostgresRfqDeletionUnit::new(pool.clone())),
            reference,
            events: Arc::new(PostgresEventStore::new(pool.clone())),
        }
    }
}

/// Facade over the procurement services.
#[derive(Debug, Clone)]
pub struct ProcurementEngine {
    rfqs: RfqService,
    quotations: QuotationService,
    payments: PaymentService,
    comparison: ComparisonEngine,
    events: Arc<dyn EventStore>,
}

impl ProcurementEngine {
    /// Builds the services from configuration and ports.
    #[must_use]
    pub fn new(config: &EngineConfig, ports: EnginePorts) -> Self {
        let calculator = PricingCalculator::new(config.pricing.money_scale);
        let publisher = EventPublisher::new(Arc::clone(&ports.events));
        let currency = config.payments.default_currency.clone();

        let rfqs = RfqService::new(
            Arc::clone(&ports.rfqs),
            Arc::clone(&ports.deletion),
            Arc::clone(&ports.reference),
            publisher.clone(),
        );
        let quotations = QuotationService::new(
            Arc::clone(&ports.rfqs),
            Arc::clone(&ports.quotations),
            Arc::clone(&ports.payments),
            Arc::clone(&ports.acceptance),
            Arc::clone(&ports.reference),
            publisher.clone(),
            calculator,
            RetryPolicy::from(&config.acceptance),
            currency.clone(),
        );
        let payments = PaymentService::new(Arc::clone(&ports.payments), publisher, currency);
        let comparison = ComparisonEngine::new(ports.rfqs, ports.quotations, calculator);

        info!(
            money_scale = config.pricing.money_scale,
            acceptance_attempts = config.acceptance.max_attempts,
            default_currency = %config.payments.default_currency,
            "procurement engine ready"
        );

        Self {
            rfqs,
            quotations,
            payments,
            comparison,
            events: ports.events,
        }
    }

    /// Builds a fully in-memory engine.
    #[must_use]
    pub fn in_memory(config: &EngineConfig, reference: Arc<dyn ReferenceDataGateway>) -> Self {
        Self::new(config, EnginePorts::in_memory(reference))
    }

    /// Builds an engine on a PostgreSQL pool.
    #[must_use]
    pub fn postgres(
        config: &EngineConfig,
        pool: &PgPool,
        reference: Arc<dyn ReferenceDataGateway>,
    ) -> Self {
        Self::new(config, EnginePorts::postgres(pool, reference))
    }

    /// RFQ lifecycle.
    #[must_use]
    pub fn rfqs(&self) -> &RfqService {
        &self.rfqs
    }

    /// Quotation lifecycle.
    #[must_use]
    pub fn quotations(&self) -> &QuotationService {
        &self.quotations
    }

    /// Payment lifecycle.
    #[must_use]
    pub fn payments(&self) -> &PaymentService {
        &self.payments
    }

    /// Quotation comparison.
    #[must_use]
    pub fn comparison(&self) -> &ComparisonEngine {
        &self.comparison
    }

    /// Event store receiving every committed change.
    #[must_use]
    pub fn events(&self) -> &Arc<dyn EventStore> {
        &self.events
    }
}
