//! Row types for the four warehouse tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Money, OrderId, ProductId, ShipmentLineId, WarehouseId};

/// A product that can be ordered. Read-only for fulfillment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub price: Money,
}

impl Product {
    pub fn new(id: impl Into<ProductId>, price: Money) -> Self {
        Self {
            id: id.into(),
            price,
        }
    }
}

/// A warehouse goods are shipped from. Only its existence matters here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: WarehouseId,
}

impl Warehouse {
    pub fn new(id: impl Into<WarehouseId>) -> Self {
        Self { id: id.into() }
    }
}

/// An order for a quantity of a product.
///
/// `fulfilled_at` moves from `None` to `Some` exactly once, when the
/// order's shipment line is committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub product_id: ProductId,
    pub amount: i32,
    pub created_at: DateTime<Utc>,
    pub fulfilled_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Creates an open (unfulfilled) order.
    pub fn new(
        id: impl Into<OrderId>,
        product_id: impl Into<ProductId>,
        amount: i32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            product_id: product_id.into(),
            amount,
            created_at,
            fulfilled_at: None,
        }
    }

    pub fn is_fulfilled(&self) -> bool {
        self.fulfilled_at.is_some()
    }
}

/// A `product_warehouse` row: the durable record of one fulfillment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentLine {
    pub id: ShipmentLineId,
    pub warehouse_id: WarehouseId,
    pub product_id: ProductId,
    pub order_id: OrderId,
    pub amount: i32,
    pub price: Money,
    pub created_at: DateTime<Utc>,
}

/// The validated input of the atomic fulfillment commit.
///
/// The price is always derived from the product's unit price; there is
/// no way to build a commit with a caller-chosen price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FulfillmentCommit {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub amount: i32,
    pub price: Money,
    pub created_at: DateTime<Utc>,
}

impl FulfillmentCommit {
    /// Builds the commit, or returns `None` if the derived price overflows.
    pub fn new(
        product: &Product,
        warehouse: &Warehouse,
        order: &Order,
        amount: i32,
        created_at: DateTime<Utc>,
    ) -> Option<Self> {
        Some(Self {
            order_id: order.id,
            product_id: product.id,
            warehouse_id: warehouse.id,
            amount,
            price: product.price.checked_multiply(amount)?,
            created_at,
        })
    }

    pub(crate) fn into_shipment_line(self, id: ShipmentLineId) -> ShipmentLine {
        ShipmentLine {
            id,
            warehouse_id: self.warehouse_id,
            product_id: self.product_id,
            order_id: self.order_id,
            amount: self.amount,
            price: self.price,
            created_at: self.created_at,
        }
    }
}
