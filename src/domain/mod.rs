//! # Domain Layer
//!
//! Aggregates, value objects, domain services and events of the procurement
//! workflow. Nothing in this layer performs I/O.
//!
//! - [`entities`]: RFQ, Quotation and Payment aggregates plus reference records
//! - [`value_objects`]: identifiers, money, quantities and lifecycle statuses
//! - [`services`]: the pricing calculator
//! - [`events`]: domain events emitted on every state change
//! - [`errors`]: the domain error type

pub mod entities;
pub mod errors;
pub mod events;
pub mod services;
pub mod value_objects;
