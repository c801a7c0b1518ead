use std::{fmt::Debug, time::Duration};

use log::*;
use mp_common::MinorUnits;

use crate::{
    db_types::{BatchConsumption, OrderGroup, OrderLine},
    traits::{FulfillmentDatabase, FulfillmentError},
};

pub const DEFAULT_FULFILLMENT_TIMEOUT: Duration = Duration::from_secs(30);

/// `FulfillmentApi` is the primary API for turning confirmed payments into order state.
///
/// It wraps a backend implementing [`FulfillmentDatabase`] and adds the execution-time bound on the fulfillment
/// transaction. There is no internal retry: retrying a failed stock check without new information would simply
/// fail again, so retry policy (one attempt after a timeout) belongs to the caller.
#[derive(Clone)]
pub struct FulfillmentApi<B> {
    db: B,
    timeout: Duration,
}

impl<B> Debug for FulfillmentApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FulfillmentApi")
    }
}

impl<B> FulfillmentApi<B> {
    pub fn new(db: B) -> Self {
        Self { db, timeout: DEFAULT_FULFILLMENT_TIMEOUT }
    }

    pub fn with_timeout(db: B, timeout: Duration) -> Self {
        Self { db, timeout }
    }
}

impl<B> FulfillmentApi<B>
where B: FulfillmentDatabase
{
    /// Run the fulfillment transaction for a confirmed payment, bounded by the configured execution timeout.
    ///
    /// On timeout the transaction is aborted and [`FulfillmentError::Timeout`] is returned; that is the only
    /// retryable failure. A [`FulfillmentError::DuplicatePaymentReference`] means another delivery of the same
    /// payment event already fulfilled the cart, and callers must resolve it as success.
    pub async fn fulfill(
        &self,
        customer_id: &str,
        cart_line_ids: &[i64],
        payment_reference: &str,
    ) -> Result<OrderGroup, FulfillmentError> {
        let work = self.db.fulfill_cart(customer_id, cart_line_ids, payment_reference);
        match tokio::time::timeout(self.timeout, work).await {
            Ok(result) => result,
            Err(_) => {
                warn!("🧾️ Fulfillment for payment {payment_reference} exceeded {:?} and was aborted", self.timeout);
                Err(FulfillmentError::Timeout)
            },
        }
    }

    /// The confirmation poller's projection: has fulfillment completed for this payment reference? Scoped to the
    /// requesting customer when one is given. Callers must tolerate `None` meaning "not yet visible".
    pub async fn confirmation_status(
        &self,
        payment_reference: &str,
        customer_id: Option<&str>,
    ) -> Result<Option<OrderGroup>, FulfillmentError> {
        self.db.fetch_order_group_by_payment_reference(payment_reference, customer_id).await
    }

    /// Recompute the expected charge for a cart snapshot: Σ quantity × current unit price.
    pub async fn expected_cart_total(
        &self,
        customer_id: &str,
        cart_line_ids: &[i64],
    ) -> Result<MinorUnits, FulfillmentError> {
        self.db.expected_cart_total(customer_id, cart_line_ids).await
    }

    pub async fn order_lines(&self, order_group_id: i64) -> Result<Vec<OrderLine>, FulfillmentError> {
        self.db.fetch_order_lines(order_group_id).await
    }

    pub async fn consumption_for_order(&self, order_id: i64) -> Result<Vec<BatchConsumption>, FulfillmentError> {
        self.db.fetch_consumption_for_order(order_id).await
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
