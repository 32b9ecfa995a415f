//! # Identifiers
//!
//! Strongly-typed identifiers.
//!
//! Aggregates and child entities owned by this engine use UUIDs. Records
//! owned by the reference catalog (companies, suppliers, categories,
//! products, discounts) are referenced by opaque string keys.
//!
//! # Examples
//!
//! ```
//! use procurement_engine::domain::value_objects::ids::{RfqId, SupplierId};
//!
//! let rfq_id = RfqId::new_v4();
//! let supplier = SupplierId::new("acme-supplies");
//! assert_ne!(rfq_id, RfqId::new_v4());
//! assert_eq!(supplier.as_str(), "acme-supplies");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a new random identifier.
            #[must_use]
            pub fn new_v4() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the wrapped UUID.
            #[inline]
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

uuid_id!(
    /// Identifier of an RFQ document.
    RfqId
);
uuid_id!(
    /// Identifier of an RFQ line item.
    RfqItemId
);
uuid_id!(
    /// Identifier of a supplier invitation on an RFQ.
    InvitationId
);
uuid_id!(
    /// Identifier of a quotation row (one per version).
    QuotationId
);
uuid_id!(
    /// Identifier of a quotation line item.
    QuotationItemId
);
uuid_id!(
    /// Identifier of a payment.
    PaymentId
);
uuid_id!(
    /// Identifier of an order settled by a payment.
    ///
    /// An accepted quotation becomes an order with the same UUID; orders
    /// created outside the RFQ flow carry their own ids.
    OrderId
);
uuid_id!(
    /// Identifier of a domain event.
    EventId
);

string_id!(
    /// Reference to a buying company.
    CompanyId
);
string_id!(
    /// Reference to a supplier.
    SupplierId
);
string_id!(
    /// Reference to a product category.
    CategoryId
);
string_id!(
    /// Reference to a catalog product.
    ProductId
);
string_id!(
    /// Reference to a product discount rule.
    DiscountId
);

impl From<QuotationId> for OrderId {
    fn from(id: QuotationId) -> Self {
        Self(id.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn uuid_ids_are_unique() {
        assert_ne!(QuotationId::new_v4(), QuotationId::new_v4());
    }

    #[test]
    fn uuid_id_parses_its_display() {
        let id = PaymentId::new_v4();
        let parsed: PaymentId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn uuid_id_rejects_garbage() {
        assert!("not-a-uuid".parse::<RfqId>().is_err());
    }

    #[test]
    fn order_id_shares_quotation_uuid() {
        let quotation = QuotationId::new_v4();
        let order = OrderId::from(quotation);
        assert_eq!(order.as_uuid(), quotation.as_uuid());
    }

    #[test]
    fn string_ids_compare_by_value() {
        assert_eq!(SupplierId::new("s-1"), SupplierId::from("s-1"));
        assert_eq!(CategoryId::new("steel").to_string(), "steel");
    }

    #[test]
    fn serde_is_transparent() {
        let id = CompanyId::new("acme");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"acme\"");
    }
}
