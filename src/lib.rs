//! # Procurement Engine
//!
//! Back-end workflow engine for B2B procurement: companies publish requests
//! for quotation, suppliers answer with versioned quotations, the company
//! compares and accepts one, and the accepted quotation is settled through a
//! payment.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │ application   ProcurementEngine                            │
//! │               RfqService  QuotationService  PaymentService │
//! │               ComparisonEngine                             │
//! ├────────────────────────────────────────────────────────────┤
//! │ domain        Rfq  Quotation  Payment  PricingCalculator   │
//! ├────────────────────────────────────────────────────────────┤
//! │ infrastructure  in-memory / PostgreSQL repositories        │
//! │                 event stores, reference data gateway       │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every aggregate write is a compare-and-swap on its version. Accepting a
//! quotation and opening its payment commit together.
//!
//! # Examples
//!
//! ```
//! use procurement_engine::application::ProcurementEngine;
//! use procurement_engine::application::dto::NewRfq;
//! use procurement_engine::config::EngineConfig;
//! use procurement_engine::domain::entities::Company;
//! use procurement_engine::infrastructure::reference_data::InMemoryReferenceData;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let catalog = InMemoryReferenceData::new().with_company(Company::new("acme", "Acme Corp"));
//! let engine = ProcurementEngine::in_memory(&EngineConfig::default(), Arc::new(catalog));
//!
//! let rfq = engine.rfqs().create(NewRfq::new("acme", "Office supplies")).await.unwrap();
//! assert_eq!(rfq.title(), "Office supplies");
//! # });
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod telemetry;
