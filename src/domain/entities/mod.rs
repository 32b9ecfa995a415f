//! # Domain Entities
//!
//! Aggregate roots and the catalog records they reference.
//!
//! ## Aggregates
//!
//! - [`Rfq`]: Request-for-Quotation with items and invitations
//! - [`Quotation`]: Supplier offer, versioned per `(RFQ, supplier)` chain
//! - [`Payment`]: Settlement of one order
//!
//! ## Reference Records
//!
//! - [`Company`], [`Supplier`], [`Category`], [`Product`], [`ProductDiscount`]

pub mod payment;
pub mod quotation;
pub mod reference;
pub mod rfq;

pub use payment::Payment;
pub use quotation::{Quotation, QuotationItem, QuotationItemSpec};
pub use reference::{Category, Company, DiscountKind, Product, ProductDiscount, Supplier};
pub use rfq::{Rfq, RfqBuilder, RfqInvitation, RfqItem, RfqItemSpec};
