//! The payment-confirmation ingestor.
//!
//! The gateway delivers payment events asynchronously and retries any webhook that does not answer quickly with a
//! 2xx, so this handler always acknowledges with a 200, including for events that fail validation. Invalid
//! signatures and amount mismatches are terminal for that event: re-delivery would not change the outcome, and a
//! non-2xx would only trigger a retry storm. Fulfillment itself is dispatched to a background task after the
//! acknowledgment, since it is I/O bound and the gateway expects a fast response.
use std::sync::Arc;

use actix_web::{rt, web, HttpRequest, HttpResponse};
use log::*;
use marketplace_engine::{FulfillmentApi, FulfillmentDatabase, FulfillmentError};

use crate::{
    config::{ServerConfig, SIGNATURE_HEADER},
    data_objects::{JsonResponse, PaymentConfirmationData, PaymentConfirmationEvent},
    helpers::calculate_hmac,
};

pub async fn payment_confirmation_webhook<B>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<FulfillmentApi<B>>,
    config: web::Data<ServerConfig>,
) -> HttpResponse
where
    B: FulfillmentDatabase + 'static,
{
    trace!("💳️ Received webhook request: {}", req.uri());
    // Recompute the keyed hash over the raw body and compare byte-for-byte with the signature header. A mismatch
    // is discarded but still acknowledged upstream, so a noise/attack event cannot trigger gateway retries.
    let signature = req.headers().get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    let expected = calculate_hmac(config.webhook_secret.reveal(), body.as_ref());
    if signature != Some(expected.as_str()) {
        warn!("💳️ Invalid or missing webhook signature. Discarding event.");
        return HttpResponse::Ok().json(JsonResponse::success("Acknowledged."));
    }
    let event: PaymentConfirmationEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!("💳️ Could not deserialize webhook payload. {e}");
            return HttpResponse::Ok().json(JsonResponse::failure("Malformed event."));
        },
    };
    let data = event.data;
    let reference = data.reference.clone();
    if !data.is_successful() {
        info!("💳️ Payment {reference} declared status '{}'. No fulfillment attempted.", data.status);
        return HttpResponse::Ok().json(JsonResponse::success("Event acknowledged."));
    }
    // Idempotency gate. This existence check is an optimization to short-circuit duplicate deliveries cheaply;
    // the uniqueness constraint on the payment reference remains the correctness guarantee.
    match api.confirmation_status(&reference, None).await {
        Ok(Some(group)) => {
            info!("💳️ Payment {reference} already fulfilled as order group [{}]. Duplicate discarded.", group.reference);
            return HttpResponse::Ok().json(JsonResponse::success("Order already fulfilled."));
        },
        Ok(None) => {},
        Err(e) => {
            error!("💳️ Could not check for an existing order group for payment {reference}. {e}");
            return HttpResponse::Ok().json(JsonResponse::failure("Unexpected error handling event."));
        },
    }
    // Re-derive the expected charge from the current cart snapshot and compare against the declared amount.
    match api.expected_cart_total(&data.metadata.customer_id, &data.metadata.cart_line_ids).await {
        Ok(expected_total) => {
            let declared = data.amount();
            if declared.abs_diff(expected_total) > config.amount_tolerance {
                warn!(
                    "💳️ Amount mismatch for payment {reference}: declared {declared}, expected {expected_total} \
                     (tolerance {}). Event logged for investigation; no fulfillment.",
                    config.amount_tolerance
                );
                return HttpResponse::Ok().json(JsonResponse::failure("Declared amount does not match the cart."));
            }
        },
        Err(FulfillmentError::EmptyCart) => {
            warn!("💳️ Payment {reference} references no fulfillable cart lines. No fulfillment attempted.");
            return HttpResponse::Ok().json(JsonResponse::failure("No cart lines to fulfill."));
        },
        Err(e) => {
            error!("💳️ Could not recompute the cart total for payment {reference}. {e}");
            return HttpResponse::Ok().json(JsonResponse::failure("Unexpected error handling event."));
        },
    }
    // All validation passed: acknowledge now, fulfill in the background. The handler must not block on it.
    let api = api.into_inner();
    rt::spawn(fulfill_in_background(api, data));
    HttpResponse::Ok().json(JsonResponse::success("Payment confirmation accepted."))
}

/// Runs the fulfillment transaction after the webhook has been acknowledged. A timed-out attempt is re-tried
/// exactly once; every other failure is terminal for this event and is logged for manual reconciliation, since
/// there is no synchronous failure path back to the checkout UI at this stage.
async fn fulfill_in_background<B: FulfillmentDatabase>(api: Arc<FulfillmentApi<B>>, data: PaymentConfirmationData) {
    let reference = data.reference;
    let customer_id = data.metadata.customer_id;
    let cart_line_ids = data.metadata.cart_line_ids;
    let mut result = api.fulfill(&customer_id, &cart_line_ids, &reference).await;
    if matches!(result, Err(ref e) if e.is_retryable()) {
        info!("💳️ Fulfillment for payment {reference} timed out. Re-attempting once.");
        result = api.fulfill(&customer_id, &cart_line_ids, &reference).await;
    }
    match result {
        Ok(group) => {
            info!("💳️ Payment {reference} fulfilled as order group [{}].", group.reference);
        },
        Err(FulfillmentError::DuplicatePaymentReference(_)) => {
            info!("💳️ Payment {reference} was fulfilled by a concurrent duplicate delivery. No-op.");
        },
        Err(e) => {
            error!(
                "💳️ Fulfillment for payment {reference} failed after the webhook was acknowledged: {e}. The \
                 reference needs manual reconciliation."
            );
        },
    }
}
