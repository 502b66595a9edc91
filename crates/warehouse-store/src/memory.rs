use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    FulfillmentCommit, Order, OrderId, Product, ProductId, Result, ShipmentLine, ShipmentLineId,
    StoreError, Warehouse, WarehouseId, store::WarehouseStore,
};

#[derive(Debug, Default)]
struct InMemoryState {
    products: BTreeMap<ProductId, Product>,
    warehouses: BTreeMap<WarehouseId, Warehouse>,
    orders: BTreeMap<OrderId, Order>,
    shipment_lines: BTreeMap<ShipmentLineId, ShipmentLine>,
    last_shipment_line_id: i32,
    fail_on_insert: bool,
    unavailable: bool,
}

impl InMemoryState {
    fn check_available(&self) -> Result<()> {
        if self.unavailable {
            return Err(StoreError::Unavailable(
                "in-memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }

    fn has_shipment_line(&self, order_id: OrderId) -> bool {
        self.shipment_lines
            .values()
            .any(|line| line.order_id == order_id)
    }
}

/// In-memory warehouse store for testing and local runs.
///
/// Provides the same interface as the PostgreSQL implementation, plus
/// seeding helpers and fault injection.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWarehouseStore {
    state: Arc<RwLock<InMemoryState>>,
}

impl InMemoryWarehouseStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_product(&self, product: Product) {
        self.state
            .write()
            .await
            .products
            .insert(product.id, product);
    }

    pub async fn insert_warehouse(&self, warehouse: Warehouse) {
        self.state
            .write()
            .await
            .warehouses
            .insert(warehouse.id, warehouse);
    }

    pub async fn insert_order(&self, order: Order) {
        self.state.write().await.orders.insert(order.id, order);
    }

    /// Returns a copy of the stored order, bypassing fault injection.
    pub async fn order(&self, id: OrderId) -> Option<Order> {
        self.state.read().await.orders.get(&id).cloned()
    }

    /// Returns the total number of shipment lines stored.
    pub async fn shipment_line_count(&self) -> usize {
        self.state.read().await.shipment_lines.len()
    }

    /// Makes the shipment line insert fail after the order update was applied.
    pub async fn set_fail_on_insert(&self, fail: bool) {
        self.state.write().await.fail_on_insert = fail;
    }

    /// Makes every store call fail as if the database were unreachable.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }
}

#[async_trait]
impl WarehouseStore for InMemoryWarehouseStore {
    async fn ping(&self) -> Result<()> {
        self.state.read().await.check_available()
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let state = self.state.read().await;
        state.check_available()?;
        Ok(state.products.get(&id).cloned())
    }

    async fn get_warehouse(&self, id: WarehouseId) -> Result<Option<Warehouse>> {
        let state = self.state.read().await;
        state.check_available()?;
        Ok(state.warehouses.get(&id).copied())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let state = self.state.read().await;
        state.check_available()?;
        Ok(state.orders.get(&id).cloned())
    }

    async fn find_order_by_product_and_amount(
        &self,
        product_id: ProductId,
        amount: i32,
    ) -> Result<Option<Order>> {
        let state = self.state.read().await;
        state.check_available()?;

        // BTreeMap iteration is by id, so min_by_key keeps the lowest id on ties.
        let order = state
            .orders
            .values()
            .filter(|o| o.product_id == product_id && o.amount == amount)
            .min_by_key(|o| state.has_shipment_line(o.id))
            .cloned();
        Ok(order)
    }

    async fn get_shipment_line_by_order(&self, order_id: OrderId) -> Result<Option<ShipmentLine>> {
        let state = self.state.read().await;
        state.check_available()?;
        Ok(state
            .shipment_lines
            .values()
            .find(|line| line.order_id == order_id)
            .cloned())
    }

    async fn get_shipment_line(&self, id: ShipmentLineId) -> Result<Option<ShipmentLine>> {
        let state = self.state.read().await;
        state.check_available()?;
        Ok(state.shipment_lines.get(&id).cloned())
    }

    async fn commit_fulfillment(&self, commit: FulfillmentCommit) -> Result<ShipmentLineId> {
        // Holding the write lock for the whole commit serializes writers.
        let mut state = self.state.write().await;
        state.check_available()?;

        let order_id = commit.order_id;
        if state.has_shipment_line(order_id) {
            return Err(StoreError::AlreadyFulfilled(order_id));
        }

        // Step 1: mark the order fulfilled.
        match state.orders.get_mut(&order_id) {
            Some(order) if !order.is_fulfilled() => {
                order.fulfilled_at = Some(commit.created_at);
            }
            _ => return Err(StoreError::AlreadyFulfilled(order_id)),
        }

        // Step 2: insert the shipment line, undoing step 1 on failure.
        if state.fail_on_insert {
            if let Some(order) = state.orders.get_mut(&order_id) {
                order.fulfilled_at = None;
            }
            return Err(StoreError::Unavailable(
                "shipment line insert failed".to_string(),
            ));
        }

        state.last_shipment_line_id += 1;
        let id = ShipmentLineId::new(state.last_shipment_line_id);
        state
            .shipment_lines
            .insert(id, commit.into_shipment_line(id));

        Ok(id)
    }
}
