//! API error types with HTTP response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use fulfillment::{FulfillmentError, ValidationErrors};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Fulfillment workflow error.
    Fulfillment(FulfillmentError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(msg) => error_body(StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => error_body(StatusCode::BAD_REQUEST, msg),
            ApiError::Fulfillment(err) => fulfillment_error_to_response(err),
        }
    }
}

fn error_body(status: StatusCode, message: String) -> Response {
    let body = serde_json::json!({ "error": message });
    (status, Json(body)).into_response()
}

/// 400 body listing every violated field.
fn validation_problem(errors: &ValidationErrors) -> Response {
    let body = serde_json::json!({
        "title": "One or more validation errors occurred.",
        "status": StatusCode::BAD_REQUEST.as_u16(),
        "errors": errors.to_map(),
    });
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

fn fulfillment_error_to_response(err: FulfillmentError) -> Response {
    match &err {
        FulfillmentError::InvalidInput(errors) => validation_problem(errors),
        FulfillmentError::ProductNotFound(_)
        | FulfillmentError::WarehouseNotFound(_)
        | FulfillmentError::OrderNotFound(_) => error_body(StatusCode::NOT_FOUND, err.to_string()),
        FulfillmentError::InvalidQuantity(_)
        | FulfillmentError::InvalidFulfillmentDate { .. }
        | FulfillmentError::AlreadyFulfilled(_)
        | FulfillmentError::PriceOverflow { .. } => {
            error_body(StatusCode::BAD_REQUEST, err.to_string())
        }
        FulfillmentError::PersistenceFailure(_) => {
            tracing::error!(error = %err, "internal server error");
            error_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}

impl From<FulfillmentError> for ApiError {
    fn from(err: FulfillmentError) -> Self {
        ApiError::Fulfillment(err)
    }
}
