//! Syntactic checks on fulfillment requests. Never touches storage.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::request::{FulfillOrder, ValidFulfillment};

/// A single rejected field with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

impl FieldViolation {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// All violations found in one request, one entry per violated field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    violations: Vec<FieldViolation>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }

    /// Groups messages by field name, as rendered in a 400 response body.
    pub fn to_map(&self) -> BTreeMap<String, Vec<String>> {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for v in &self.violations {
            map.entry(v.field.to_string())
                .or_default()
                .push(v.message.clone());
        }
        map
    }

    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.violations.push(FieldViolation::new(field, message));
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .violations
            .iter()
            .map(|v| format!("{}: {}", v.field, v.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Validates the shape of a fulfillment request.
///
/// Field names in violations match the JSON body (`idProduct`, `amount`, ...).
pub fn validate(req: &FulfillOrder) -> Result<ValidFulfillment, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    match req.amount {
        None => errors.push("amount", "'amount' must not be empty."),
        Some(amount) if amount <= 0 => {
            errors.push("amount", "'amount' must be greater than '0'.")
        }
        Some(_) => {}
    }

    if req.created_at.is_none() {
        errors.push("createdAt", "'createdAt' must not be empty.");
    }

    match req.product_id {
        None => errors.push("idProduct", "'idProduct' must not be empty."),
        Some(id) if !id.is_assigned() => {
            errors.push("idProduct", "'idProduct' must be a positive identifier.")
        }
        Some(_) => {}
    }

    match req.warehouse_id {
        None => errors.push("idWarehouse", "'idWarehouse' must not be empty."),
        Some(id) if !id.is_assigned() => errors.push(
            "idWarehouse",
            "'idWarehouse' must be a positive identifier.",
        ),
        Some(_) => {}
    }

    if let Some(id) = req.order_id
        && !id.is_assigned()
    {
        errors.push("idOrder", "'idOrder' must be a positive identifier.");
    }

    match (req.product_id, req.warehouse_id, req.amount, req.created_at) {
        (Some(product_id), Some(warehouse_id), Some(amount), Some(created_at))
            if errors.is_empty() =>
        {
            Ok(ValidFulfillment {
                product_id,
                warehouse_id,
                amount,
                created_at,
                order_id: req.order_id,
            })
        }
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn valid_request() -> FulfillOrder {
        FulfillOrder::new(1, 1, 3, Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap())
    }

    #[test]
    fn accepts_complete_request() {
        let valid = validate(&valid_request()).unwrap();
        assert_eq!(valid.amount, 3);
        assert_eq!(valid.order_id, None);
    }

    #[test]
    fn rejects_zero_amount() {
        let req = FulfillOrder {
            amount: Some(0),
            ..valid_request()
        };
        let errors = validate(&req).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.contains_field("amount"));
    }

    #[test]
    fn rejects_negative_amount() {
        let req = FulfillOrder {
            amount: Some(-4),
            ..valid_request()
        };
        assert!(validate(&req).unwrap_err().contains_field("amount"));
    }

    #[test]
    fn reports_every_missing_field() {
        let errors = validate(&FulfillOrder::default()).unwrap_err();
        assert_eq!(errors.len(), 4);
        let map = errors.to_map();
        assert!(map.contains_key("amount"));
        assert!(map.contains_key("createdAt"));
        assert!(map.contains_key("idProduct"));
        assert!(map.contains_key("idWarehouse"));
    }

    #[test]
    fn rejects_zero_identifiers() {
        let req = FulfillOrder::new(0, 0, 3, Utc::now()).for_order(0);
        let errors = validate(&req).unwrap_err();
        assert!(errors.contains_field("idProduct"));
        assert!(errors.contains_field("idWarehouse"));
        assert!(errors.contains_field("idOrder"));
        assert!(!errors.contains_field("amount"));
    }

    #[test]
    fn display_lists_fields() {
        let req = FulfillOrder {
            amount: Some(0),
            created_at: None,
            ..valid_request()
        };
        let text = validate(&req).unwrap_err().to_string();
        assert!(text.contains("amount:"));
        assert!(text.contains("createdAt:"));
    }
}
