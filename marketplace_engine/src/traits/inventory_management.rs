use thiserror::Error;

use crate::db_types::{Batch, CartLine, NewBatch, NewProduct, Product};

/// Batch-ledger and collaborator operations: stocking, batch activation, and the cart surface the ingestor's
/// amount check relies on.
///
/// Every mutation here maintains the invariant that a product's cached `quantity` equals the sum of `remaining`
/// over its active, non-deleted batches.
#[allow(async_fn_in_trait)]
pub trait InventoryManagement: Clone {
    async fn create_product(&self, product: NewProduct) -> Result<Product, InventoryError>;

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, InventoryError>;

    /// Add stock for a product (initial stocking or a refill). Creates a new batch with a generated unique code
    /// and bumps the product aggregate, atomically.
    async fn add_stock(&self, batch: NewBatch) -> Result<Batch, InventoryError>;

    /// Activate or deactivate a batch. The product aggregate is adjusted by the batch's remaining quantity so the
    /// aggregate keeps tracking active batches only. Flipping to the current state is a no-op.
    async fn set_batch_active(&self, batch_id: i64, active: bool) -> Result<Batch, InventoryError>;

    /// Soft-delete a batch. Only allowed while the batch has no recorded consumption; once any sale has drawn from
    /// it, the batch is part of the audit trail and must stay.
    async fn remove_batch(&self, batch_id: i64) -> Result<(), InventoryError>;

    /// All batches for a product, including inactive and soft-deleted ones, oldest first.
    async fn fetch_batches_for_product(&self, product_id: i64) -> Result<Vec<Batch>, InventoryError>;

    async fn add_cart_line(&self, customer_id: &str, product_id: i64, quantity: i64)
    -> Result<CartLine, InventoryError>;

    async fn fetch_cart_for_customer(&self, customer_id: &str) -> Result<Vec<CartLine>, InventoryError>;
}

#[derive(Debug, Clone, Error)]
pub enum InventoryError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("The requested product {0} does not exist")]
    ProductNotFound(i64),
    #[error("The requested batch {0} does not exist")]
    BatchNotFound(i64),
    #[error("Batch {0} has recorded consumption and cannot be removed")]
    BatchInUse(i64),
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),
}

impl From<sqlx::Error> for InventoryError {
    fn from(e: sqlx::Error) -> Self {
        InventoryError::DatabaseError(e.to_string())
    }
}
