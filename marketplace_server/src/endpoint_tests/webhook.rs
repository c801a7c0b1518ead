use std::time::Duration;

use actix_web::http::StatusCode;
use marketplace_engine::InventoryApi;
use mp_common::MinorUnits;

use super::helpers::{
    get_status,
    new_test_db,
    payment_event,
    post_webhook,
    seed_cart,
    sign,
    test_config,
    wait_for_confirmation,
};

#[actix_web::test]
async fn signed_payment_event_fulfills_the_cart() {
    let db = new_test_db().await;
    let config = test_config(db.url());
    let (product_id, line_ids) = seed_cart(&db, "cust-100", 1200, 10, 2).await;

    let body = payment_event("pay-ok-1", 2400, "cust-100", &line_ids);
    let (status, ack) = post_webhook(&db, &config, &body, Some(&sign(&body))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(ack.success);

    let result = wait_for_confirmation(&db, "pay-ok-1", "cust-100").await.expect("fulfillment never landed");
    let group = result.order_group.expect("order group missing from a found result");
    assert_eq!(group.total, MinorUnits::from(2400));

    let inventory = InventoryApi::new(db.clone());
    let product = inventory.fetch_product(product_id).await.expect("fetch").expect("product");
    assert_eq!(product.quantity, 8);
    assert!(inventory.cart_for_customer("cust-100").await.expect("cart").is_empty());
}

#[actix_web::test]
async fn invalid_signature_is_discarded_but_acknowledged() {
    let db = new_test_db().await;
    let config = test_config(db.url());
    let (product_id, line_ids) = seed_cart(&db, "cust-101", 500, 5, 1).await;

    let body = payment_event("pay-forged", 500, "cust-101", &line_ids);
    let (status, ack) = post_webhook(&db, &config, &body, Some("bm90IGEgcmVhbCBzaWduYXR1cmU=")).await;
    assert_eq!(status, StatusCode::OK);
    // The ack is success-shaped so a forger learns nothing from the response.
    assert!(ack.success);

    tokio::time::sleep(Duration::from_millis(200)).await;
    let (_, result) = get_status(&db, "pay-forged", "cust-101").await;
    assert!(!result.found);
    let product = InventoryApi::new(db.clone()).fetch_product(product_id).await.expect("fetch").expect("product");
    assert_eq!(product.quantity, 5);
}

#[actix_web::test]
async fn missing_signature_is_discarded_but_acknowledged() {
    let db = new_test_db().await;
    let config = test_config(db.url());
    let (_, line_ids) = seed_cart(&db, "cust-102", 500, 5, 1).await;

    let body = payment_event("pay-unsigned", 500, "cust-102", &line_ids);
    let (status, ack) = post_webhook(&db, &config, &body, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(ack.success);

    tokio::time::sleep(Duration::from_millis(200)).await;
    let (_, result) = get_status(&db, "pay-unsigned", "cust-102").await;
    assert!(!result.found);
}

#[actix_web::test]
async fn amount_mismatch_is_acknowledged_without_fulfillment() {
    let db = new_test_db().await;
    let config = test_config(db.url());
    let (product_id, line_ids) = seed_cart(&db, "cust-103", 1000, 10, 3).await;

    // Declared 2999 against an expected 3000, with zero tolerance.
    let body = payment_event("pay-short", 2999, "cust-103", &line_ids);
    let (status, ack) = post_webhook(&db, &config, &body, Some(&sign(&body))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!ack.success);

    tokio::time::sleep(Duration::from_millis(200)).await;
    let (_, result) = get_status(&db, "pay-short", "cust-103").await;
    assert!(!result.found);
    let product = InventoryApi::new(db.clone()).fetch_product(product_id).await.expect("fetch").expect("product");
    assert_eq!(product.quantity, 10);
}

#[actix_web::test]
async fn tolerance_absorbs_small_rounding_differences() {
    let db = new_test_db().await;
    let mut config = test_config(db.url());
    config.amount_tolerance = 5;
    let (_, line_ids) = seed_cart(&db, "cust-104", 1000, 10, 3).await;

    let body = payment_event("pay-rounded", 2997, "cust-104", &line_ids);
    let (status, ack) = post_webhook(&db, &config, &body, Some(&sign(&body))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(ack.success);

    let result = wait_for_confirmation(&db, "pay-rounded", "cust-104").await.expect("fulfillment never landed");
    assert_eq!(result.order_group.expect("order group").total, MinorUnits::from(3000));
}

#[actix_web::test]
async fn non_success_status_is_acknowledged_without_fulfillment() {
    let db = new_test_db().await;
    let config = test_config(db.url());
    let (_, line_ids) = seed_cart(&db, "cust-105", 800, 4, 2).await;

    let body = payment_event("pay-failed", 1600, "cust-105", &line_ids).replace("success", "failed");
    let (status, ack) = post_webhook(&db, &config, &body, Some(&sign(&body))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(ack.success);

    tokio::time::sleep(Duration::from_millis(200)).await;
    let (_, result) = get_status(&db, "pay-failed", "cust-105").await;
    assert!(!result.found);
}

#[actix_web::test]
async fn duplicate_delivery_after_fulfillment_is_a_no_op() {
    let db = new_test_db().await;
    let config = test_config(db.url());
    let (product_id, line_ids) = seed_cart(&db, "cust-106", 1500, 6, 2).await;

    let body = payment_event("pay-dup", 3000, "cust-106", &line_ids);
    let (_, first) = post_webhook(&db, &config, &body, Some(&sign(&body))).await;
    assert!(first.success);
    wait_for_confirmation(&db, "pay-dup", "cust-106").await.expect("fulfillment never landed");

    // The gateway re-delivers the identical event.
    let (status, second) = post_webhook(&db, &config, &body, Some(&sign(&body))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(second.success);
    assert_eq!(second.message, "Order already fulfilled.");

    tokio::time::sleep(Duration::from_millis(200)).await;
    let product = InventoryApi::new(db.clone()).fetch_product(product_id).await.expect("fetch").expect("product");
    assert_eq!(product.quantity, 4);
}

#[actix_web::test]
async fn malformed_payload_is_acknowledged() {
    let db = new_test_db().await;
    let config = test_config(db.url());

    let body = r#"{"event": "payment.confirmed", "data": {"status": "success"}}"#;
    let (status, ack) = post_webhook(&db, &config, body, Some(&sign(body))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!ack.success);
}

#[actix_web::test]
async fn timed_out_fulfillment_is_retried_then_left_for_reconciliation() {
    let db = new_test_db().await;
    let mut config = test_config(db.url());
    // A zero execution bound makes both the background attempt and its single retry abort.
    config.fulfillment_timeout = Duration::from_millis(0);
    let (product_id, line_ids) = seed_cart(&db, "cust-107", 400, 5, 1).await;

    let body = payment_event("pay-slow-1", 400, "cust-107", &line_ids);
    let (status, ack) = post_webhook(&db, &config, &body, Some(&sign(&body))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(ack.success);

    // The event was acknowledged but never fulfilled: no order group, cart and stock untouched.
    tokio::time::sleep(Duration::from_millis(300)).await;
    let (_, result) = get_status(&db, "pay-slow-1", "cust-107").await;
    assert!(!result.found);
    let inventory = InventoryApi::new(db.clone());
    assert_eq!(inventory.cart_for_customer("cust-107").await.expect("cart").len(), 1);
    let product = inventory.fetch_product(product_id).await.expect("fetch").expect("product");
    assert_eq!(product.quantity, 5);
}
