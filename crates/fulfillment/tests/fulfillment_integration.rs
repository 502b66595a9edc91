//! Integration tests for the fulfillment workflow.
//!
//! These tests exercise the full request path against the in-memory store:
//! validation, cross-entity checks, and the atomic commit.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use common::{Money, OrderId, ShipmentLineId};
use fulfillment::{FulfillOrder, FulfillmentError, FulfillmentService};
use warehouse_store::{InMemoryWarehouseStore, Order, Product, Warehouse, WarehouseStore};

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
}

/// Product 1 at $10.00, warehouse 1, open order 5 for 3 units created 2024-01-01.
async fn create_service() -> FulfillmentService<InMemoryWarehouseStore> {
    let store = InMemoryWarehouseStore::new();
    store
        .insert_product(Product::new(1, Money::from_cents(1000)))
        .await;
    store.insert_warehouse(Warehouse::new(1)).await;
    store.insert_order(Order::new(5, 1, 3, day(1))).await;
    FulfillmentService::new(store)
}

mod scenarios {
    use super::*;

    #[tokio::test]
    async fn fulfill_open_order() {
        let service = create_service().await;

        let id = service
            .fulfill_order(FulfillOrder::new(1, 1, 3, day(2)))
            .await
            .unwrap();
        assert_eq!(id, ShipmentLineId::new(1));

        let line = service.get_shipment_line(id).await.unwrap().unwrap();
        assert_eq!(line.price, Money::from_cents(3000));
        assert_eq!(line.amount, 3);
        assert_eq!(line.created_at, day(2));

        let order = service.store().order(OrderId::new(5)).await.unwrap();
        assert_eq!(order.fulfilled_at, Some(day(2)));
    }

    #[tokio::test]
    async fn second_identical_request_is_already_fulfilled() {
        let service = create_service().await;
        service
            .fulfill_order(FulfillOrder::new(1, 1, 3, day(2)))
            .await
            .unwrap();

        let result = service
            .fulfill_order(FulfillOrder::new(1, 1, 3, day(3)))
            .await;

        assert!(matches!(result, Err(FulfillmentError::AlreadyFulfilled(id)) if id == OrderId::new(5)));
        assert_eq!(service.store().shipment_line_count().await, 1);
        let order = service.store().order(OrderId::new(5)).await.unwrap();
        assert_eq!(order.fulfilled_at, Some(day(2)));
    }

    #[tokio::test]
    async fn zero_amount_is_invalid_input() {
        let service = create_service().await;

        let result = service
            .fulfill_order(FulfillOrder::new(1, 1, 0, day(2)))
            .await;

        assert!(matches!(result, Err(FulfillmentError::InvalidInput(_))));
        assert_eq!(service.store().shipment_line_count().await, 0);
    }
}

mod properties {
    use super::*;

    #[tokio::test]
    async fn failed_insert_leaves_order_unfulfilled() {
        let service = create_service().await;
        service.store().set_fail_on_insert(true).await;

        let result = service
            .fulfill_order(FulfillOrder::new(1, 1, 3, day(2)))
            .await;

        assert!(matches!(
            result,
            Err(FulfillmentError::PersistenceFailure(_))
        ));
        let order = service.store().order(OrderId::new(5)).await.unwrap();
        assert_eq!(order.fulfilled_at, None);
        assert_eq!(service.store().shipment_line_count().await, 0);

        // Once the fault clears the same request goes through.
        service.store().set_fail_on_insert(false).await;
        assert!(
            service
                .fulfill_order(FulfillOrder::new(1, 1, 3, day(2)))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn price_is_unit_price_times_amount() {
        let store = InMemoryWarehouseStore::new();
        store
            .insert_product(Product::new(7, Money::from_cents(1999)))
            .await;
        store.insert_warehouse(Warehouse::new(1)).await;
        for (id, amount) in [(1, 1), (2, 4), (3, 250)] {
            store.insert_order(Order::new(id, 7, amount, day(1))).await;
        }
        let service = FulfillmentService::new(store);

        for amount in [1, 4, 250] {
            let id = service
                .fulfill_order(FulfillOrder::new(7, 1, amount, day(2)))
                .await
                .unwrap();
            let line = service.get_shipment_line(id).await.unwrap().unwrap();
            assert_eq!(line.price, Money::from_cents(1999 * i64::from(amount)));
        }
    }

    #[tokio::test]
    async fn overflowing_price_is_rejected_without_commit() {
        let store = InMemoryWarehouseStore::new();
        store
            .insert_product(Product::new(1, Money::from_cents(10_i64.pow(16))))
            .await;
        store.insert_warehouse(Warehouse::new(1)).await;
        store.insert_order(Order::new(5, 1, 1000, day(1))).await;
        let service = FulfillmentService::new(store);

        let result = service
            .fulfill_order(FulfillOrder::new(1, 1, 1000, day(2)))
            .await;

        assert!(matches!(
            result,
            Err(FulfillmentError::PriceOverflow { amount: 1000, .. })
        ));
        assert_eq!(service.store().shipment_line_count().await, 0);
        let order = service.store().order(OrderId::new(5)).await.unwrap();
        assert_eq!(order.fulfilled_at, None);
    }

    #[tokio::test]
    async fn fulfillment_dated_before_order_is_rejected() {
        let service = create_service().await;
        let before = day(1) - chrono::Duration::seconds(1);

        let result = service
            .fulfill_order(FulfillOrder::new(1, 1, 3, before))
            .await;

        assert!(matches!(
            result,
            Err(FulfillmentError::InvalidFulfillmentDate { .. })
        ));
        assert_eq!(service.store().shipment_line_count().await, 0);
    }

    #[tokio::test]
    async fn unmatched_amount_is_order_not_found() {
        let service = create_service().await;

        let result = service
            .fulfill_order(FulfillOrder::new(1, 1, 4, day(2)))
            .await;

        match result {
            Err(FulfillmentError::OrderNotFound(lookup)) => {
                assert_eq!(lookup.amount, 4);
                assert_eq!(lookup.order_id, None);
            }
            other => panic!("expected OrderNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn orders_sharing_product_and_amount_are_fulfilled_in_turn() {
        let service = create_service().await;
        service
            .store()
            .insert_order(Order::new(6, 1, 3, day(1)))
            .await;

        let first = service
            .fulfill_order(FulfillOrder::new(1, 1, 3, day(2)))
            .await
            .unwrap();
        let second = service
            .fulfill_order(FulfillOrder::new(1, 1, 3, day(2)))
            .await
            .unwrap();

        let first = service.get_shipment_line(first).await.unwrap().unwrap();
        let second = service.get_shipment_line(second).await.unwrap().unwrap();
        assert_eq!(first.order_id, OrderId::new(5));
        assert_eq!(second.order_id, OrderId::new(6));

        let third = service
            .fulfill_order(FulfillOrder::new(1, 1, 3, day(2)))
            .await;
        assert!(matches!(third, Err(FulfillmentError::AlreadyFulfilled(_))));
    }
}

mod concurrency {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_requests_for_one_order_commit_once() {
        let service = Arc::new(create_service().await);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .fulfill_order(FulfillOrder::new(1, 1, 3, day(2)))
                        .await
                })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(FulfillmentError::AlreadyFulfilled(_)) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(service.store().shipment_line_count().await, 1);
        assert!(
            service
                .store()
                .get_shipment_line_by_order(OrderId::new(5))
                .await
                .unwrap()
                .is_some()
        );
    }
}
