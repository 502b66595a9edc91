use async_trait::async_trait;

use crate::{
    FulfillmentCommit, Order, OrderId, Product, ProductId, Result, ShipmentLine, ShipmentLineId,
    Warehouse, WarehouseId,
};

/// Data access for the fulfillment workflow.
///
/// Lookups return `Ok(None)` for absent rows; `Err` is reserved for
/// infrastructure faults. All implementations must be thread-safe.
#[async_trait]
pub trait WarehouseStore: Send + Sync {
    /// Checks that the store is reachable.
    async fn ping(&self) -> Result<()>;

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    async fn get_warehouse(&self, id: WarehouseId) -> Result<Option<Warehouse>>;

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Finds an order for `product_id` with exactly `amount` units.
    ///
    /// When several orders match, one without a shipment line is preferred,
    /// then the lowest id, so the result is deterministic.
    async fn find_order_by_product_and_amount(
        &self,
        product_id: ProductId,
        amount: i32,
    ) -> Result<Option<Order>>;

    /// Returns the shipment line recorded for an order, if it was fulfilled.
    async fn get_shipment_line_by_order(&self, order_id: OrderId) -> Result<Option<ShipmentLine>>;

    async fn get_shipment_line(&self, id: ShipmentLineId) -> Result<Option<ShipmentLine>>;

    /// Atomically marks the order fulfilled and inserts its shipment line.
    ///
    /// Either both effects are persisted or neither is. Returns the
    /// identifier the store assigned to the new shipment line.
    async fn commit_fulfillment(&self, commit: FulfillmentCommit) -> Result<ShipmentLineId>;
}

/// Extension trait providing convenience methods for warehouse stores.
#[async_trait]
pub trait WarehouseStoreExt: WarehouseStore {
    /// Checks if an order already has a shipment line.
    async fn is_order_fulfilled(&self, order_id: OrderId) -> Result<bool> {
        Ok(self.get_shipment_line_by_order(order_id).await?.is_some())
    }
}

impl<T: WarehouseStore + ?Sized> WarehouseStoreExt for T {}
