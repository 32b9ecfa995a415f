//! # Application Layer
//!
//! Use cases over the domain, driven through the infrastructure ports.
//!
//! - [`services`]: RFQ, quotation and payment lifecycles, comparison
//! - [`engine`]: the facade wiring them together
//! - [`dto`]: request types
//! - [`error`]: the caller-facing error taxonomy

pub mod dto;
pub mod engine;
pub mod error;
pub mod services;

pub use engine::{EnginePorts, ProcurementEngine};
pub use error::{ApplicationError, ApplicationResult, ErrorKind};
