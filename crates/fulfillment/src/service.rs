//! The order fulfillment workflow.

use common::ShipmentLineId;
use warehouse_store::{FulfillmentCommit, Order, ShipmentLine, WarehouseStore, WarehouseStoreExt};

use crate::error::{FulfillmentError, OrderLookup};
use crate::request::{FulfillOrder, ValidFulfillment};
use crate::validation::validate;

/// Service that fulfills orders against a warehouse store.
///
/// Holds no per-request state; one instance is shared by all requests and
/// every coordination between them is left to the store's commit.
pub struct FulfillmentService<S: WarehouseStore> {
    store: S,
}

impl<S: WarehouseStore> FulfillmentService<S> {
    /// Creates a new fulfillment service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fulfills an order and returns the id of the new shipment line.
    ///
    /// Checks run in a fixed order and stop at the first failure:
    /// validation, product, warehouse, quantity, order match, date, and
    /// at-most-once fulfillment. Only then is the commit attempted.
    #[tracing::instrument(
        skip(self),
        fields(
            product_id = tracing::field::Empty,
            warehouse_id = tracing::field::Empty,
            amount = tracing::field::Empty
        )
    )]
    pub async fn fulfill_order(&self, req: FulfillOrder) -> Result<ShipmentLineId, FulfillmentError> {
        metrics::counter!("fulfillment_requests_total").increment(1);
        let start = std::time::Instant::now();

        let result = self.run(req).await;

        metrics::histogram!("fulfillment_duration_seconds").record(start.elapsed().as_secs_f64());
        match &result {
            Ok(id) => {
                metrics::counter!("fulfillment_commits_total").increment(1);
                tracing::info!(shipment_line_id = %id, "order fulfilled");
            }
            Err(FulfillmentError::PersistenceFailure(err)) => {
                metrics::counter!("fulfillment_rejections_total", "reason" => "persistence_failure")
                    .increment(1);
                tracing::error!(error = %err, "fulfillment failed in storage");
            }
            Err(err) => {
                metrics::counter!("fulfillment_rejections_total", "reason" => err.reason())
                    .increment(1);
                tracing::info!(reason = err.reason(), error = %err, "fulfillment rejected");
            }
        }
        result
    }

    async fn run(&self, req: FulfillOrder) -> Result<ShipmentLineId, FulfillmentError> {
        // 1. Shape checks, before any storage access
        let valid = validate(&req)?;

        let span = tracing::Span::current();
        span.record("product_id", valid.product_id.as_i32());
        span.record("warehouse_id", valid.warehouse_id.as_i32());
        span.record("amount", valid.amount);

        // 2. Product
        let product = self
            .store
            .get_product(valid.product_id)
            .await?
            .ok_or(FulfillmentError::ProductNotFound(valid.product_id))?;

        // 3. Warehouse
        let warehouse = self
            .store
            .get_warehouse(valid.warehouse_id)
            .await?
            .ok_or(FulfillmentError::WarehouseNotFound(valid.warehouse_id))?;

        // 4. Quantity, re-checked before it is used as a lookup key
        if valid.amount <= 0 {
            return Err(FulfillmentError::InvalidQuantity(valid.amount));
        }

        // 5. Matching order
        let order = self.find_order(&valid).await?;

        // 6. A shipment cannot predate its order
        if order.created_at > valid.created_at {
            return Err(FulfillmentError::InvalidFulfillmentDate {
                order_created_at: order.created_at,
                requested: valid.created_at,
            });
        }

        // 7. At most one shipment line per order
        if self.store.is_order_fulfilled(order.id).await? {
            return Err(FulfillmentError::AlreadyFulfilled(order.id));
        }

        // 8. Atomic commit
        let commit = FulfillmentCommit::new(
            &product,
            &warehouse,
            &order,
            valid.amount,
            valid.created_at,
        )
        .ok_or(FulfillmentError::PriceOverflow {
            unit_price: product.price,
            amount: valid.amount,
        })?;
        Ok(self.store.commit_fulfillment(commit).await?)
    }

    /// Resolves the order to fulfill.
    ///
    /// An explicit order id is the primary key; product and amount must
    /// still match it. Without one, the order is matched by product and amount.
    async fn find_order(&self, valid: &ValidFulfillment) -> Result<Order, FulfillmentError> {
        let lookup = OrderLookup {
            order_id: valid.order_id,
            product_id: valid.product_id,
            amount: valid.amount,
        };

        let order = match valid.order_id {
            Some(order_id) => self
                .store
                .get_order(order_id)
                .await?
                .filter(|o| o.product_id == valid.product_id && o.amount == valid.amount),
            None => {
                self.store
                    .find_order_by_product_and_amount(valid.product_id, valid.amount)
                    .await?
            }
        };

        order.ok_or(FulfillmentError::OrderNotFound(lookup))
    }

    /// Loads a shipment line by id.
    #[tracing::instrument(skip(self))]
    pub async fn get_shipment_line(
        &self,
        id: ShipmentLineId,
    ) -> Result<Option<ShipmentLine>, FulfillmentError> {
        Ok(self.store.get_shipment_line(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use common::{Money, OrderId};
    use warehouse_store::{InMemoryWarehouseStore, Product, Warehouse};

    use super::*;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    async fn seeded_service() -> FulfillmentService<InMemoryWarehouseStore> {
        let store = InMemoryWarehouseStore::new();
        store
            .insert_product(Product::new(1, Money::from_cents(1000)))
            .await;
        store.insert_warehouse(Warehouse::new(1)).await;
        store.insert_order(Order::new(5, 1, 3, day(1))).await;
        FulfillmentService::new(store)
    }

    #[tokio::test]
    async fn fulfill_creates_priced_shipment_line() {
        let service = seeded_service().await;

        let id = service
            .fulfill_order(FulfillOrder::new(1, 1, 3, day(2)))
            .await
            .unwrap();

        let line = service.get_shipment_line(id).await.unwrap().unwrap();
        assert_eq!(line.price, Money::from_cents(3000));
        assert_eq!(line.order_id, OrderId::new(5));

        let order = service.store().order(OrderId::new(5)).await.unwrap();
        assert_eq!(order.fulfilled_at, Some(day(2)));
    }

    #[tokio::test]
    async fn same_day_fulfillment_is_allowed() {
        let service = seeded_service().await;
        let result = service.fulfill_order(FulfillOrder::new(1, 1, 3, day(1))).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn invalid_input_skips_storage() {
        let service = seeded_service().await;
        // An unavailable store would turn any lookup into a persistence failure.
        service.store().set_unavailable(true).await;

        let result = service.fulfill_order(FulfillOrder::new(1, 1, 0, day(2))).await;

        assert!(matches!(result, Err(FulfillmentError::InvalidInput(ref e)) if e.contains_field("amount")));
    }

    #[tokio::test]
    async fn missing_product() {
        let service = seeded_service().await;
        let result = service.fulfill_order(FulfillOrder::new(2, 1, 3, day(2))).await;
        assert!(matches!(result, Err(FulfillmentError::ProductNotFound(_))));
    }

    #[tokio::test]
    async fn missing_warehouse() {
        let service = seeded_service().await;
        let result = service.fulfill_order(FulfillOrder::new(1, 2, 3, day(2))).await;
        assert!(matches!(result, Err(FulfillmentError::WarehouseNotFound(_))));
    }

    #[tokio::test]
    async fn explicit_order_must_match_product_and_amount() {
        let service = seeded_service().await;

        let mismatch = service
            .fulfill_order(FulfillOrder::new(1, 1, 4, day(2)).for_order(5))
            .await;
        assert!(matches!(mismatch, Err(FulfillmentError::OrderNotFound(_))));

        let ok = service
            .fulfill_order(FulfillOrder::new(1, 1, 3, day(2)).for_order(5))
            .await;
        assert!(ok.is_ok());
    }

    #[tokio::test]
    async fn store_outage_is_persistence_failure() {
        let service = seeded_service().await;
        service.store().set_unavailable(true).await;

        let result = service.fulfill_order(FulfillOrder::new(1, 1, 3, day(2))).await;
        assert!(matches!(result, Err(FulfillmentError::PersistenceFailure(_))));
    }
}
