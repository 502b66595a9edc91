pub mod health;
pub mod metrics;
pub mod product_warehouse;
