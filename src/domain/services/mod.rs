//! # Domain Services
//!
//! Domain logic that doesn't naturally belong to a single aggregate.
//!
//! ## Services
//!
//! - [`pricing::PricingCalculator`]: line pricing with item and tier discounts

pub mod pricing;

pub use pricing::{DEFAULT_MONEY_SCALE, PricedLine, PricingCalculator};
