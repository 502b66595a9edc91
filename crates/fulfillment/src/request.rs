//! Fulfillment request types.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use common::{OrderId, ProductId, WarehouseId};
use serde::{Deserialize, Deserializer, Serialize, de};

/// Offset-less timestamp layouts accepted after RFC 3339, read as UTC.
const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Request to fulfill an order from a warehouse.
///
/// Every field is optional at this level so that missing values surface
/// as validation violations rather than decoding failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillOrder {
    #[serde(rename = "idProduct")]
    pub product_id: Option<ProductId>,
    #[serde(rename = "idWarehouse")]
    pub warehouse_id: Option<WarehouseId>,
    pub amount: Option<i32>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    /// Explicit order to fulfill. When absent the order is matched by
    /// product and amount.
    #[serde(rename = "idOrder", default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
}

impl FulfillOrder {
    /// Creates a request with every required field set.
    pub fn new(
        product_id: impl Into<ProductId>,
        warehouse_id: impl Into<WarehouseId>,
        amount: i32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            product_id: Some(product_id.into()),
            warehouse_id: Some(warehouse_id.into()),
            amount: Some(amount),
            created_at: Some(created_at),
            order_id: None,
        }
    }

    /// Targets a specific order instead of matching by product and amount.
    pub fn for_order(mut self, order_id: impl Into<OrderId>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }
}

/// Parses a request timestamp.
///
/// Accepts RFC 3339, then `YYYY-MM-DDTHH:MM:SS[.fff]` and `YYYY-MM-DD`
/// without an offset, which are taken as UTC (a bare date is midnight).
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|raw| {
        parse_timestamp(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp '{raw}'")))
    })
    .transpose()
}

/// A request that passed validation; all required fields are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidFulfillment {
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub amount: i32,
    pub created_at: DateTime<Utc>,
    pub order_id: Option<OrderId>,
}
