use marketplace_engine::{
    db_types::{NewBatch, NewProduct, Product},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    InventoryManagement,
    SqliteDatabase,
};
use mp_common::MinorUnits;

pub async fn new_test_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url).await.expect("Error creating database")
}

pub async fn seed_product(db: &SqliteDatabase, name: &str, unit_price: i64) -> Product {
    db.create_product(NewProduct::new(name, MinorUnits::from(unit_price), "vendor-1"))
        .await
        .expect("Error creating product")
}

/// Stock a product and return the new batch id.
pub async fn stock(db: &SqliteDatabase, product_id: i64, quantity: i64) -> i64 {
    db.add_stock(NewBatch::new(product_id, quantity, MinorUnits::from(50))).await.expect("Error adding stock").id
}

/// Asserts the core inventory invariant: the product's cached aggregate equals the sum of remaining quantity over
/// its active, non-deleted batches.
pub async fn assert_aggregate_invariant(db: &SqliteDatabase, product_id: i64) {
    let product = db.fetch_product(product_id).await.expect("Error fetching product").expect("Product missing");
    let batches = db.fetch_batches_for_product(product_id).await.expect("Error fetching batches");
    let batch_sum: i64 = batches.iter().filter(|b| b.active && !b.deleted).map(|b| b.remaining).sum();
    assert_eq!(
        product.quantity, batch_sum,
        "Aggregate invariant violated for product {product_id}: cached {} != batch sum {batch_sum}",
        product.quantity
    );
    assert!(batches.iter().all(|b| b.remaining >= 0), "A batch went negative for product {product_id}");
}
