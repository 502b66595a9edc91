//! HTTP API server for the warehouse fulfillment service.
//!
//! Exposes the product-warehouse endpoints over any [`WarehouseStore`],
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use fulfillment::FulfillmentService;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use warehouse_store::WarehouseStore;

/// Shared application state accessible from all handlers.
pub struct AppState<S: WarehouseStore> {
    pub fulfillment: FulfillmentService<S>,
}

/// Creates the application state over a store.
pub fn create_state<S: WarehouseStore + 'static>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState {
        fulfillment: FulfillmentService::new(store),
    })
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: WarehouseStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S>))
        .route(
            "/product-warehouse",
            post(routes::product_warehouse::create::<S>),
        )
        .route(
            "/product-warehouse/{id}",
            get(routes::product_warehouse::get::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
