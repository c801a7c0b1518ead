use sqlx::{QueryBuilder, SqliteConnection};

use crate::db_types::{CartLine, CartLineSnapshot};

pub async fn insert_cart_line(
    customer_id: &str,
    product_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<CartLine, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO cart_lines (customer_id, product_id, quantity)
            VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(customer_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_one(conn)
    .await
}

pub async fn fetch_cart_for_customer(
    customer_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<CartLine>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM cart_lines WHERE customer_id = $1 ORDER BY id ASC")
        .bind(customer_id)
        .fetch_all(conn)
        .await
}

/// Fetch the current snapshot (quantity joined with live product name and unit price) of the given cart lines,
/// scoped to the customer. Lines that don't exist or belong to someone else are simply absent from the result.
pub async fn fetch_snapshot(
    customer_id: &str,
    cart_line_ids: &[i64],
    conn: &mut SqliteConnection,
) -> Result<Vec<CartLineSnapshot>, sqlx::Error> {
    if cart_line_ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::new(
        r#"
            SELECT
                cart_lines.id AS id,
                cart_lines.product_id AS product_id,
                products.name AS product_name,
                cart_lines.quantity AS quantity,
                products.unit_price AS unit_price
            FROM cart_lines JOIN products ON products.id = cart_lines.product_id
            WHERE cart_lines.customer_id =
        "#,
    );
    builder.push_bind(customer_id);
    builder.push(" AND cart_lines.id IN (");
    let mut ids = builder.separated(", ");
    for id in cart_line_ids {
        ids.push_bind(*id);
    }
    builder.push(") ORDER BY cart_lines.id ASC");
    let lines = builder.build_query_as::<CartLineSnapshot>().fetch_all(conn).await?;
    Ok(lines)
}

/// Delete the given cart lines. Returns the number of rows removed.
pub async fn delete_lines(cart_line_ids: &[i64], conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    if cart_line_ids.is_empty() {
        return Ok(0);
    }
    let mut builder = QueryBuilder::new("DELETE FROM cart_lines WHERE id IN (");
    let mut ids = builder.separated(", ");
    for id in cart_line_ids {
        ids.push_bind(*id);
    }
    builder.push(")");
    let result = builder.build().execute(conn).await?;
    Ok(result.rows_affected())
}
