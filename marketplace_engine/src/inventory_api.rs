use std::fmt::Debug;

use crate::{
    db_types::{Batch, CartLine, NewBatch, NewProduct, Product},
    traits::{InventoryError, InventoryManagement},
};

/// Public API over the batch ledger: stocking, activation and the cart collaborator surface.
#[derive(Clone)]
pub struct InventoryApi<B> {
    db: B,
}

impl<B> Debug for InventoryApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "InventoryApi")
    }
}

impl<B> InventoryApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> InventoryApi<B>
where B: InventoryManagement
{
    pub async fn create_product(&self, product: NewProduct) -> Result<Product, InventoryError> {
        self.db.create_product(product).await
    }

    pub async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, InventoryError> {
        self.db.fetch_product(product_id).await
    }

    pub async fn add_stock(&self, batch: NewBatch) -> Result<Batch, InventoryError> {
        self.db.add_stock(batch).await
    }

    pub async fn set_batch_active(&self, batch_id: i64, active: bool) -> Result<Batch, InventoryError> {
        self.db.set_batch_active(batch_id, active).await
    }

    pub async fn remove_batch(&self, batch_id: i64) -> Result<(), InventoryError> {
        self.db.remove_batch(batch_id).await
    }

    pub async fn batches_for_product(&self, product_id: i64) -> Result<Vec<Batch>, InventoryError> {
        self.db.fetch_batches_for_product(product_id).await
    }

    pub async fn add_cart_line(
        &self,
        customer_id: &str,
        product_id: i64,
        quantity: i64,
    ) -> Result<CartLine, InventoryError> {
        self.db.add_cart_line(customer_id, product_id, quantity).await
    }

    pub async fn cart_for_customer(&self, customer_id: &str) -> Result<Vec<CartLine>, InventoryError> {
        self.db.fetch_cart_for_customer(customer_id).await
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
