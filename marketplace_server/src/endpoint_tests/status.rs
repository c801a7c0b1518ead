use actix_web::http::StatusCode;
use marketplace_engine::{db_types::OrderGroupStatus, FulfillmentDatabase};

use super::helpers::{get_status, new_test_db, seed_cart};

#[actix_web::test]
async fn unknown_reference_reads_as_not_found() {
    let db = new_test_db().await;
    let (status, result) = get_status(&db, "pay-nowhere", "cust-200").await;
    // "Not yet" is a normal polling answer, not an error.
    assert_eq!(status, StatusCode::OK);
    assert!(!result.found);
    assert!(result.order_group.is_none());
}

#[actix_web::test]
async fn fulfilled_order_is_visible_to_its_customer_only() {
    let db = new_test_db().await;
    let (_, line_ids) = seed_cart(&db, "cust-201", 900, 5, 2).await;
    db.fulfill_cart("cust-201", &line_ids, "pay-visible").await.expect("fulfillment failed");

    let (status, result) = get_status(&db, "pay-visible", "cust-201").await;
    assert_eq!(status, StatusCode::OK);
    assert!(result.found);
    let group = result.order_group.expect("order group");
    assert_eq!(group.status, OrderGroupStatus::Fulfilled);
    assert!(group.delivered_at.is_none());

    // Another customer polling the same reference learns nothing.
    let (status, result) = get_status(&db, "pay-visible", "cust-999").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!result.found);
}
