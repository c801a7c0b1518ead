//! `SqliteDatabase` is a concrete implementation of a marketplace engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module. The fulfillment transaction lives here: one `pool.begin()` .. `tx.commit()` scope spanning cart,
//! product, batch, order and consumption state, so that nothing partially commits.
use std::fmt::Debug;

use log::*;
use mp_common::MinorUnits;
use sqlx::SqlitePool;

use super::db::{batches, cart, new_pool, order_groups, orders, products};
use crate::{
    allocation::{allocate, AllocationPlan},
    db_types::{Batch, BatchConsumption, CartLine, CartLineSnapshot, NewBatch, NewProduct, OrderGroup, OrderLine, Product},
    traits::{FulfillmentDatabase, FulfillmentError, InventoryError, InventoryManagement},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }
}

impl FulfillmentDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fulfill_cart(
        &self,
        customer_id: &str,
        cart_line_ids: &[i64],
        payment_reference: &str,
    ) -> Result<OrderGroup, FulfillmentError> {
        let mut tx = self.pool.begin().await?;
        let lines = cart::fetch_snapshot(customer_id, cart_line_ids, &mut tx).await?;
        if lines.is_empty() {
            return Err(FulfillmentError::EmptyCart);
        }
        // Only the snapshotted lines are allocated, so only those ids may be deleted at the end. Input ids that
        // did not survive the customer scoping (another customer's lines, stale ids) must stay untouched.
        let consumed_ids = lines.iter().map(|line| line.id).collect::<Vec<i64>>();
        // Validation pass. No mutation happens until every line has a complete allocation plan. The aggregate
        // check is a fast pre-filter; the per-batch allocation against transaction-visible state is authoritative,
        // since the cached aggregate can be stale relative to batch-level truth.
        let mut shortfalls: Vec<String> = Vec::new();
        let mut plans: Vec<AllocationPlan> = Vec::with_capacity(lines.len());
        for line in &lines {
            let product = products::fetch_product(line.product_id, &mut tx)
                .await?
                .ok_or(FulfillmentError::ProductNotFound(line.product_id))?;
            if line.quantity > product.quantity {
                shortfalls.push(product.name);
                continue;
            }
            let fifo = batches::fetch_active_batches_fifo(line.product_id, &mut tx).await?;
            let plan = allocate(&fifo, line.quantity);
            if plan.fully_allocated {
                plans.push(plan);
            } else {
                shortfalls.push(product.name);
            }
        }
        if !shortfalls.is_empty() {
            debug!("🧾️ Fulfillment for payment {payment_reference} aborted. Insufficient stock: {}", shortfalls.join(", "));
            return Err(FulfillmentError::InsufficientInventory(shortfalls.join(", ")));
        }
        let total: MinorUnits = lines.iter().map(CartLineSnapshot::line_total).sum();
        let group = order_groups::insert_order_group(customer_id, payment_reference, total, &mut tx).await?;
        for (line, plan) in lines.iter().zip(&plans) {
            let order = orders::insert_order_line(group.id, line, plan.total_drawn(), &mut tx).await?;
            // Batches are updated in ascending id order so overlapping fulfillments contend in a stable order.
            let mut draws = plan.draws.clone();
            draws.sort_by_key(|d| d.batch_id);
            for draw in &draws {
                orders::insert_consumption(order.id, draw, &mut tx).await?;
                if !batches::decrement_remaining(draw.batch_id, draw.quantity, &mut tx).await? {
                    // Validated above, so a guard miss means a concurrent fulfillment won the race.
                    warn!("🧾️ Batch {} depleted under payment {payment_reference}. Rolling back.", draw.batch_id);
                    return Err(FulfillmentError::InsufficientInventory(line.product_name.clone()));
                }
            }
            if !products::adjust_quantity(line.product_id, -line.quantity, &mut tx).await? {
                warn!(
                    "🧾️ Product {} aggregate depleted under payment {payment_reference}. Rolling back.",
                    line.product_id
                );
                return Err(FulfillmentError::InsufficientInventory(line.product_name.clone()));
            }
        }
        let removed = cart::delete_lines(&consumed_ids, &mut tx).await?;
        tx.commit().await?;
        info!(
            "🧾️ Payment {payment_reference} fulfilled as order group [{}]: {} line(s), {removed} cart line(s) cleared, total {total}",
            group.reference,
            lines.len()
        );
        Ok(group)
    }

    async fn fetch_order_group_by_payment_reference(
        &self,
        payment_reference: &str,
        customer_id: Option<&str>,
    ) -> Result<Option<OrderGroup>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        let group = order_groups::fetch_by_payment_reference(payment_reference, customer_id, &mut conn).await?;
        Ok(group)
    }

    async fn fetch_order_lines(&self, order_group_id: i64) -> Result<Vec<OrderLine>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        let lines = orders::fetch_lines_for_group(order_group_id, &mut conn).await?;
        Ok(lines)
    }

    async fn fetch_consumption_for_order(&self, order_id: i64) -> Result<Vec<BatchConsumption>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        let consumption = orders::fetch_consumption_for_order(order_id, &mut conn).await?;
        Ok(consumption)
    }

    async fn cart_snapshot(
        &self,
        customer_id: &str,
        cart_line_ids: &[i64],
    ) -> Result<Vec<CartLineSnapshot>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        let snapshot = cart::fetch_snapshot(customer_id, cart_line_ids, &mut conn).await?;
        Ok(snapshot)
    }
}

impl InventoryManagement for SqliteDatabase {
    async fn create_product(&self, product: NewProduct) -> Result<Product, InventoryError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::insert_product(&product, &mut conn).await?;
        debug!("📦️ Product [{}] created with id {}", product.name, product.id);
        Ok(product)
    }

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, InventoryError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(product_id, &mut conn).await?;
        Ok(product)
    }

    async fn add_stock(&self, batch: NewBatch) -> Result<Batch, InventoryError> {
        if batch.quantity <= 0 {
            return Err(InventoryError::InvalidQuantity(batch.quantity));
        }
        let mut tx = self.pool.begin().await?;
        if products::fetch_product(batch.product_id, &mut tx).await?.is_none() {
            return Err(InventoryError::ProductNotFound(batch.product_id));
        }
        let created = batches::insert_batch(&batch, &mut tx).await?;
        products::adjust_quantity(batch.product_id, batch.quantity, &mut tx).await?;
        tx.commit().await?;
        info!("📦️ Stocked {} units of product {} as batch [{}]", batch.quantity, batch.product_id, created.code);
        Ok(created)
    }

    async fn set_batch_active(&self, batch_id: i64, active: bool) -> Result<Batch, InventoryError> {
        let mut tx = self.pool.begin().await?;
        let batch = batches::fetch_batch(batch_id, &mut tx).await?.ok_or(InventoryError::BatchNotFound(batch_id))?;
        if batch.active == active {
            return Ok(batch);
        }
        let updated = batches::set_active(batch_id, active, &mut tx).await?;
        let delta = if active { batch.remaining } else { -batch.remaining };
        products::adjust_quantity(batch.product_id, delta, &mut tx).await?;
        tx.commit().await?;
        debug!("📦️ Batch [{}] is now {}", updated.code, if active { "active" } else { "inactive" });
        Ok(updated)
    }

    async fn remove_batch(&self, batch_id: i64) -> Result<(), InventoryError> {
        let mut tx = self.pool.begin().await?;
        let batch = batches::fetch_batch(batch_id, &mut tx).await?.ok_or(InventoryError::BatchNotFound(batch_id))?;
        if batch.deleted {
            return Ok(());
        }
        if batches::has_consumption(batch_id, &mut tx).await? {
            return Err(InventoryError::BatchInUse(batch_id));
        }
        batches::soft_delete(batch_id, &mut tx).await?;
        if batch.active {
            products::adjust_quantity(batch.product_id, -batch.remaining, &mut tx).await?;
        }
        tx.commit().await?;
        info!("📦️ Batch [{}] removed (soft delete)", batch.code);
        Ok(())
    }

    async fn fetch_batches_for_product(&self, product_id: i64) -> Result<Vec<Batch>, InventoryError> {
        let mut conn = self.pool.acquire().await?;
        let batches = batches::fetch_batches_for_product(product_id, &mut conn).await?;
        Ok(batches)
    }

    async fn add_cart_line(
        &self,
        customer_id: &str,
        product_id: i64,
        quantity: i64,
    ) -> Result<CartLine, InventoryError> {
        if quantity <= 0 {
            return Err(InventoryError::InvalidQuantity(quantity));
        }
        let mut conn = self.pool.acquire().await?;
        if products::fetch_product(product_id, &mut conn).await?.is_none() {
            return Err(InventoryError::ProductNotFound(product_id));
        }
        let line = cart::insert_cart_line(customer_id, product_id, quantity, &mut conn).await?;
        Ok(line)
    }

    async fn fetch_cart_for_customer(&self, customer_id: &str) -> Result<Vec<CartLine>, InventoryError> {
        let mut conn = self.pool.acquire().await?;
        let lines = cart::fetch_cart_for_customer(customer_id, &mut conn).await?;
        Ok(lines)
    }
}
