//! # Reference Data
//!
//! Gateway onto the external catalog: companies, suppliers, categories,
//! products and product discount tiers.

pub mod in_memory;
pub mod traits;

pub use in_memory::InMemoryReferenceData;
pub use traits::ReferenceDataGateway;
