use serde::{Deserialize, Serialize};

/// Declares a storage-keyed identifier wrapping the `i32` primary key.
///
/// Each identifier is its own type so a warehouse id can never be passed
/// where an order id is expected.
macro_rules! int_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Creates an identifier from a raw key.
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Returns the underlying key.
            pub const fn as_i32(&self) -> i32 {
                self.0
            }

            /// Returns true if this is a usable key (strictly positive).
            pub const fn is_assigned(&self) -> bool {
                self.0 > 0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

int_id!(
    /// Identifier of a product.
    ProductId
);

int_id!(
    /// Identifier of a warehouse.
    WarehouseId
);

int_id!(
    /// Identifier of a customer order awaiting fulfillment.
    OrderId
);

int_id!(
    /// Identifier of a shipment line (a `product_warehouse` row).
    ShipmentLineId
);
