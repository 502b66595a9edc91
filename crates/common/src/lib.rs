//! Shared types for the warehouse fulfillment service.

pub mod money;
pub mod types;

pub use money::Money;
pub use types::{OrderId, ProductId, ShipmentLineId, WarehouseId};
