use sqlx::SqliteConnection;

use crate::db_types::{NewProduct, Product};

pub async fn insert_product(product: &NewProduct, conn: &mut SqliteConnection) -> Result<Product, sqlx::Error> {
    let product = sqlx::query_as(
        r#"
            INSERT INTO products (name, unit_price, vendor_id)
            VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(&product.name)
    .bind(product.unit_price)
    .bind(&product.vendor_id)
    .fetch_one(conn)
    .await?;
    Ok(product)
}

pub async fn fetch_product(product_id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product =
        sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(product_id).fetch_optional(conn).await?;
    Ok(product)
}

/// Adjust the cached aggregate quantity of a product by `delta` (which may be negative). Returns `false` when the
/// product does not exist or the adjustment would drive the aggregate negative; in the latter case nothing is
/// changed, and a fulfillment caller must abort its transaction.
pub async fn adjust_quantity(product_id: i64, delta: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
            UPDATE products
            SET quantity = quantity + $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND quantity + $1 >= 0
        "#,
    )
    .bind(delta)
    .bind(product_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}
