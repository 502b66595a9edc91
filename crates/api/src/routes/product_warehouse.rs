//! Product-warehouse (shipment line) endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use common::ShipmentLineId;
use fulfillment::FulfillOrder;
use serde::Serialize;
use warehouse_store::{ShipmentLine, WarehouseStore};

use crate::AppState;
use crate::error::ApiError;

// -- Response types --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentLineResponse {
    pub id_product_warehouse: i32,
    pub id_warehouse: i32,
    pub id_product: i32,
    pub id_order: i32,
    pub amount: i32,
    pub price: f64,
    pub created_at: String,
}

impl From<ShipmentLine> for ShipmentLineResponse {
    fn from(line: ShipmentLine) -> Self {
        Self {
            id_product_warehouse: line.id.as_i32(),
            id_warehouse: line.warehouse_id.as_i32(),
            id_product: line.product_id.as_i32(),
            id_order: line.order_id.as_i32(),
            amount: line.amount,
            price: line.price.as_major_units(),
            created_at: line.created_at.to_rfc3339(),
        }
    }
}

// -- Handlers --

/// POST /product-warehouse — fulfill an order from a warehouse.
///
/// Responds 201 with the new shipment line id as the body and its
/// location in the `Location` header.
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: WarehouseStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<FulfillOrder>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let id = state.fulfillment.fulfill_order(req).await?;

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/product-warehouse/{id}"))],
        Json(id.as_i32()),
    ))
}

/// GET /product-warehouse/:id — load a shipment line.
#[tracing::instrument(skip(state))]
pub async fn get<S: WarehouseStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i32>,
) -> Result<Json<ShipmentLineResponse>, ApiError> {
    let line = state
        .fulfillment
        .get_shipment_line(ShipmentLineId::new(id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product warehouse {id} not found")))?;

    Ok(Json(line.into()))
}
