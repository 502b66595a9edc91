use thiserror::Error;

use crate::OrderId;

/// Errors that can occur when interacting with the warehouse store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The order was fulfilled by a concurrent commit.
    /// Raised when the guarded update matches no row or the
    /// one-shipment-per-order constraint rejects the insert.
    #[error("Order {0} is already fulfilled")]
    AlreadyFulfilled(OrderId),

    /// The store could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for warehouse store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
