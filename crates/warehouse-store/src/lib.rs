pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod store;

pub use common::{Money, OrderId, ProductId, ShipmentLineId, WarehouseId};
pub use error::{Result, StoreError};
pub use memory::InMemoryWarehouseStore;
pub use model::{FulfillmentCommit, Order, Product, ShipmentLine, Warehouse};
pub use postgres::PostgresWarehouseStore;
pub use store::{WarehouseStore, WarehouseStoreExt};
