use sqlx::SqliteConnection;

use crate::{
    allocation::BatchDraw,
    db_types::{BatchConsumption, CartLineSnapshot, OrderLine},
};

pub async fn insert_order_line(
    order_group_id: i64,
    line: &CartLineSnapshot,
    quantity_allocated: i64,
    conn: &mut SqliteConnection,
) -> Result<OrderLine, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO orders (order_group_id, product_id, quantity_requested, quantity_allocated, unit_price)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(order_group_id)
    .bind(line.product_id)
    .bind(line.quantity)
    .bind(quantity_allocated)
    .bind(line.unit_price)
    .fetch_one(conn)
    .await
}

pub async fn insert_consumption(
    order_id: i64,
    draw: &BatchDraw,
    conn: &mut SqliteConnection,
) -> Result<BatchConsumption, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO batch_consumption (order_id, batch_id, quantity)
            VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(draw.batch_id)
    .bind(draw.quantity)
    .fetch_one(conn)
    .await
}

pub async fn fetch_lines_for_group(
    order_group_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderLine>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE order_group_id = $1 ORDER BY id ASC")
        .bind(order_group_id)
        .fetch_all(conn)
        .await
}

pub async fn fetch_consumption_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<BatchConsumption>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM batch_consumption WHERE order_id = $1 ORDER BY batch_id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await
}
