//! Fulfillment error types.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId, WarehouseId};
use thiserror::Error;
use warehouse_store::StoreError;

use crate::validation::ValidationErrors;

/// The key an order was looked up by, for not-found reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLookup {
    pub order_id: Option<OrderId>,
    pub product_id: ProductId,
    pub amount: i32,
}

impl std::fmt::Display for OrderLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.order_id {
            Some(id) => write!(
                f,
                "Order {id} with product id {} and amount {} not found",
                self.product_id, self.amount
            ),
            None => write!(
                f,
                "Order with product id {} and amount {} not found",
                self.product_id, self.amount
            ),
        }
    }
}

/// Errors that can occur while fulfilling an order.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// The request failed syntactic validation.
    #[error("Invalid input: {0}")]
    InvalidInput(ValidationErrors),

    #[error("Product with id {0} not found")]
    ProductNotFound(ProductId),

    #[error("Warehouse with id {0} not found")]
    WarehouseNotFound(WarehouseId),

    /// Amount was not positive at the point of order lookup.
    #[error("Amount must be greater than 0, got {0}")]
    InvalidQuantity(i32),

    #[error("{0}")]
    OrderNotFound(OrderLookup),

    /// The shipment would be dated before the order it fulfills.
    #[error("Wrong order date: order created at {order_created_at}, fulfillment dated {requested}")]
    InvalidFulfillmentDate {
        order_created_at: DateTime<Utc>,
        requested: DateTime<Utc>,
    },

    #[error("Order {0} is already completed")]
    AlreadyFulfilled(OrderId),

    /// Unit price times amount does not fit the price representation.
    #[error("Price of {amount} units at {unit_price} each is out of range")]
    PriceOverflow { unit_price: Money, amount: i32 },

    /// A storage fault during a lookup or the commit.
    #[error("Persistence failure: {0}")]
    PersistenceFailure(StoreError),
}

impl FulfillmentError {
    /// Short stable label used as a metrics tag.
    pub fn reason(&self) -> &'static str {
        match self {
            FulfillmentError::InvalidInput(_) => "invalid_input",
            FulfillmentError::ProductNotFound(_) => "product_not_found",
            FulfillmentError::WarehouseNotFound(_) => "warehouse_not_found",
            FulfillmentError::InvalidQuantity(_) => "invalid_quantity",
            FulfillmentError::OrderNotFound(_) => "order_not_found",
            FulfillmentError::InvalidFulfillmentDate { .. } => "invalid_fulfillment_date",
            FulfillmentError::AlreadyFulfilled(_) => "already_fulfilled",
            FulfillmentError::PriceOverflow { .. } => "price_overflow",
            FulfillmentError::PersistenceFailure(_) => "persistence_failure",
        }
    }
}

impl From<ValidationErrors> for FulfillmentError {
    fn from(errors: ValidationErrors) -> Self {
        FulfillmentError::InvalidInput(errors)
    }
}

impl From<StoreError> for FulfillmentError {
    fn from(err: StoreError) -> Self {
        match err {
            // A concurrent request committed first.
            StoreError::AlreadyFulfilled(order_id) => FulfillmentError::AlreadyFulfilled(order_id),
            other => FulfillmentError::PersistenceFailure(other),
        }
    }
}
