//! Read-side endpoints: health check and the order-status poller.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use marketplace_engine::{FulfillmentApi, FulfillmentDatabase};
use serde::Deserialize;

use crate::{data_objects::ConfirmationStatusResult, errors::ServerError};

/// Route handler for the health check endpoint
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusQuery {
    pub customer_id: String,
}

/// Route handler for the order-status poller.
///
/// A checkout UI polls this after handing off to the payment gateway. The lookup is scoped to the calling
/// customer, so a payment reference belonging to someone else reads the same as one that does not exist yet.
/// "Not found" is a normal polling answer and is returned as a 200 with `found: false` rather than a 404.
pub async fn order_status<B: FulfillmentDatabase>(
    path: web::Path<String>,
    query: web::Query<StatusQuery>,
    api: web::Data<FulfillmentApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let payment_reference = path.into_inner();
    trace!("💻️ Order status request for payment {payment_reference}");
    let result = api
        .confirmation_status(&payment_reference, Some(&query.customer_id))
        .await
        .map_err(|e| {
            error!("💻️ Could not read the order status for payment {payment_reference}. {e}");
            ServerError::BackendError(e.to_string())
        })?;
    let response = match result {
        Some(group) => ConfirmationStatusResult::found(group),
        None => ConfirmationStatusResult::not_found(),
    };
    Ok(HttpResponse::Ok().json(response))
}
