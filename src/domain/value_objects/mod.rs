//! # Value Objects
//!
//! Immutable types with validation and domain semantics.
//!
//! ## Identity Types
//!
//! - [`RfqId`], [`QuotationId`], [`PaymentId`], [`OrderId`]: UUID-based identifiers
//! - [`CompanyId`], [`SupplierId`], [`CategoryId`], [`ProductId`]: catalog keys
//! - [`EventId`]: Domain event identifier
//!
//! ## Money
//!
//! - [`Price`]: Non-negative decimal amount
//! - [`Quantity`]: Strictly positive decimal quantity
//! - [`ItemDiscount`]: Percentage or fixed amount off a quotation line
//! - [`CheckedArithmetic`]: Overflow-safe decimal math
//!
//! ## Lifecycle Enums
//!
//! - [`RfqStatus`], [`QuotationStatus`], [`PaymentStatus`]: status machines
//!   with central transition tables
//! - [`RfqType`], [`InvitationStatus`]

pub mod arithmetic;
pub mod discount;
pub mod enums;
pub mod ids;
pub mod payment_status;
pub mod price;
pub mod quantity;
pub mod quotation_status;
pub mod rfq_status;
pub mod timestamp;

pub use arithmetic::{ArithmeticError, ArithmeticResult, CheckedArithmetic};
pub use discount::ItemDiscount;
pub use enums::{InvitationStatus, ParseEnumError, RfqType};
pub use ids::{
    CategoryId, CompanyId, DiscountId, EventId, InvitationId, OrderId, PaymentId, ProductId,
    QuotationId, QuotationItemId, RfqId, RfqItemId, SupplierId,
};
pub use payment_status::PaymentStatus;
pub use price::Price;
pub use quantity::Quantity;
pub use quotation_status::QuotationStatus;
pub use rfq_status::RfqStatus;
pub use timestamp::Timestamp;
