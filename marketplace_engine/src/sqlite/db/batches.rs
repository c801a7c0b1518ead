use log::{debug, warn};
use sqlx::SqliteConnection;

use super::unique_violation_on;
use crate::{
    db_types::{Batch, NewBatch},
    helpers,
};

/// Inserts a new batch with a freshly generated code, regenerating on code collision. The loop is unbounded by
/// design (the collision probability is effectively zero); persistent looping indicates a shrinking code space or
/// a bug, so it is logged.
pub async fn insert_batch(batch: &NewBatch, conn: &mut SqliteConnection) -> Result<Batch, sqlx::Error> {
    let mut attempts = 0u32;
    loop {
        let code = helpers::generate(helpers::DEFAULT_BATCH_CODE_LENGTH);
        let result = sqlx::query_as::<_, Batch>(
            r#"
                INSERT INTO batches (code, product_id, remaining, cost_basis, expires_on)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *;
            "#,
        )
        .bind(&code)
        .bind(batch.product_id)
        .bind(batch.quantity)
        .bind(batch.cost_basis)
        .bind(batch.expires_on)
        .fetch_one(&mut *conn)
        .await;
        match result {
            Ok(batch) => {
                debug!("📦️ Batch [{}] inserted with id {}", batch.code, batch.id);
                return Ok(batch);
            },
            Err(e) if unique_violation_on(&e, "batches.code") => {
                attempts += 1;
                if attempts >= crate::helpers::COLLISION_WARN_THRESHOLD {
                    warn!("📦️ Batch code collision retry #{attempts} for product {}", batch.product_id);
                }
            },
            Err(e) => return Err(e),
        }
    }
}

pub async fn fetch_batch(batch_id: i64, conn: &mut SqliteConnection) -> Result<Option<Batch>, sqlx::Error> {
    let batch = sqlx::query_as("SELECT * FROM batches WHERE id = $1").bind(batch_id).fetch_optional(conn).await?;
    Ok(batch)
}

/// The FIFO batch set the allocation algorithm runs against: active, non-deleted, positive-remaining batches of
/// the product, oldest-created first, ties broken by ascending id. This ordering is the sell-oldest-stock-first
/// policy and must not change.
pub async fn fetch_active_batches_fifo(
    product_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Batch>, sqlx::Error> {
    let batches = sqlx::query_as(
        r#"
            SELECT * FROM batches
            WHERE product_id = $1 AND active AND NOT deleted AND remaining > 0
            ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(product_id)
    .fetch_all(conn)
    .await?;
    Ok(batches)
}

pub async fn fetch_batches_for_product(
    product_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Batch>, sqlx::Error> {
    let batches = sqlx::query_as("SELECT * FROM batches WHERE product_id = $1 ORDER BY created_at ASC, id ASC")
        .bind(product_id)
        .fetch_all(conn)
        .await?;
    Ok(batches)
}

/// Draw `quantity` units from the batch. Returns `false` when the batch holds less than `quantity`, in which case
/// nothing is changed and the caller must abort its transaction. The `remaining >= $1` guard is what keeps batch
/// quantities non-negative even if two fulfillments raced past the validation reads.
pub async fn decrement_remaining(
    batch_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE batches SET remaining = remaining - $1 WHERE id = $2 AND remaining >= $1")
        .bind(quantity)
        .bind(batch_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn set_active(batch_id: i64, active: bool, conn: &mut SqliteConnection) -> Result<Batch, sqlx::Error> {
    sqlx::query_as("UPDATE batches SET active = $1 WHERE id = $2 RETURNING *")
        .bind(active)
        .bind(batch_id)
        .fetch_one(conn)
        .await
}

pub async fn soft_delete(batch_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE batches SET deleted = TRUE, active = FALSE WHERE id = $1")
        .bind(batch_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Whether any order line has ever drawn stock from this batch.
pub async fn has_consumption(batch_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM batch_consumption WHERE batch_id = $1)")
        .bind(batch_id)
        .fetch_one(conn)
        .await?;
    Ok(exists)
}
