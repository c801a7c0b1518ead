use std::time::Duration;

use actix_web::{http::StatusCode, test, test::TestRequest, web, App};
use marketplace_engine::{
    db_types::{NewBatch, NewProduct},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    FulfillmentApi,
    InventoryApi,
    SqliteDatabase,
};
use mp_common::{MinorUnits, Secret};

use crate::{
    config::{ServerConfig, SIGNATURE_HEADER},
    data_objects::{
        ConfirmationStatusResult,
        JsonResponse,
        PaymentConfirmationData,
        PaymentConfirmationEvent,
        PaymentMetadata,
    },
    helpers::calculate_hmac,
    routes::order_status,
    webhook_routes::payment_confirmation_webhook,
};

// A test-only secret. DO NOT re-use this key anywhere.
pub const TEST_WEBHOOK_SECRET: &str = "endpoint-test-webhook-secret";

pub async fn new_test_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url).await.expect("Error creating connection to database")
}

pub fn test_config(database_url: &str) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
        database_url: database_url.into(),
        webhook_secret: Secret::new(TEST_WEBHOOK_SECRET.to_string()),
        amount_tolerance: 0,
        fulfillment_timeout: Duration::from_secs(5),
    }
}

/// Creates a product, stocks it with one batch, and adds a cart line for the customer. Returns
/// `(product_id, cart_line_ids)`.
pub async fn seed_cart(
    db: &SqliteDatabase,
    customer_id: &str,
    unit_price: i64,
    stock_qty: i64,
    cart_qty: i64,
) -> (i64, Vec<i64>) {
    let inventory = InventoryApi::new(db.clone());
    let product = inventory
        .create_product(NewProduct::new("Test product", MinorUnits::from(unit_price), "vendor-1"))
        .await
        .expect("create");
    inventory.add_stock(NewBatch::new(product.id, stock_qty, MinorUnits::from(unit_price / 2))).await.expect("stock");
    let line = inventory.add_cart_line(customer_id, product.id, cart_qty).await.expect("cart line");
    (product.id, vec![line.id])
}

pub fn payment_event(reference: &str, amount: i64, customer_id: &str, cart_line_ids: &[i64]) -> String {
    let event = PaymentConfirmationEvent {
        event: "payment.confirmed".to_string(),
        data: PaymentConfirmationData {
            status: "success".to_string(),
            reference: reference.to_string(),
            amount,
            metadata: PaymentMetadata {
                customer_id: customer_id.to_string(),
                cart_line_ids: cart_line_ids.to_vec(),
            },
        },
    };
    serde_json::to_string(&event).expect("serialize event")
}

pub fn sign(body: &str) -> String {
    calculate_hmac(TEST_WEBHOOK_SECRET, body.as_bytes())
}

pub async fn post_webhook(
    db: &SqliteDatabase,
    config: &ServerConfig,
    body: &str,
    signature: Option<&str>,
) -> (StatusCode, JsonResponse) {
    let app = App::new()
        .app_data(web::Data::new(FulfillmentApi::with_timeout(db.clone(), config.fulfillment_timeout)))
        .app_data(web::Data::new(config.clone()))
        .route("/webhook/payment-confirmation", web::post().to(payment_confirmation_webhook::<SqliteDatabase>));
    let service = test::init_service(app).await;
    let mut req = TestRequest::post().uri("/webhook/payment-confirmation").set_payload(body.to_string());
    if let Some(sig) = signature {
        req = req.insert_header((SIGNATURE_HEADER, sig));
    }
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body: JsonResponse = test::read_body_json(res).await;
    (status, body)
}

pub async fn get_status(
    db: &SqliteDatabase,
    payment_reference: &str,
    customer_id: &str,
) -> (StatusCode, ConfirmationStatusResult) {
    let app = App::new()
        .app_data(web::Data::new(FulfillmentApi::new(db.clone())))
        .route("/order-status/{payment_reference}", web::get().to(order_status::<SqliteDatabase>));
    let service = test::init_service(app).await;
    let req = TestRequest::get()
        .uri(&format!("/order-status/{payment_reference}?customer_id={customer_id}"))
        .to_request();
    let res = test::call_service(&service, req).await;
    let status = res.status();
    let body: ConfirmationStatusResult = test::read_body_json(res).await;
    (status, body)
}

/// Polls the status endpoint until the background fulfillment lands, or gives up after a few seconds.
pub async fn wait_for_confirmation(
    db: &SqliteDatabase,
    payment_reference: &str,
    customer_id: &str,
) -> Option<ConfirmationStatusResult> {
    for _ in 0..60 {
        let (_, result) = get_status(db, payment_reference, customer_id).await;
        if result.found {
            return Some(result);
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    None
}
