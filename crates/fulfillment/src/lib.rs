//! Order fulfillment for the warehouse service.
//!
//! This crate provides:
//! - Syntactic validation of fulfillment requests
//! - The fulfillment workflow, which checks the request against stored
//!   products, warehouses and orders before committing a shipment line

pub mod error;
pub mod request;
pub mod service;
pub mod validation;

pub use error::{FulfillmentError, OrderLookup};
pub use request::{FulfillOrder, ValidFulfillment};
pub use service::FulfillmentService;
pub use validation::{FieldViolation, ValidationErrors, validate};
