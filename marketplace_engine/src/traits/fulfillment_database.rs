use mp_common::MinorUnits;
use thiserror::Error;

use crate::db_types::{BatchConsumption, CartLineSnapshot, OrderGroup, OrderLine};

/// This trait defines the highest level of behaviour for backends supporting the fulfillment flow.
///
/// This behaviour includes:
/// * Running the fulfillment transaction for a confirmed payment.
/// * Idempotency lookups keyed on the gateway payment reference.
/// * Read-side projections used by the confirmation poller and the ingestor's amount check.
#[allow(async_fn_in_trait)]
pub trait FulfillmentDatabase: Clone {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Run the fulfillment transaction for `customer_id`'s cart lines, in a single atomic unit:
    ///
    /// 1. Validate the cart is non-empty and every line is coverable by the product aggregate *and* by the
    ///    authoritative per-batch FIFO allocation, both evaluated against transaction-visible state.
    /// 2. Create the order group (generated unique reference, the given payment reference, recomputed total) and
    ///    one order line per cart line.
    /// 3. Record one consumption row per batch draw, decrement the drawn batches and the product aggregates.
    /// 4. Delete the consumed cart lines.
    ///
    /// Any failure aborts the whole unit; nothing partially commits. A uniqueness violation on the payment
    /// reference is surfaced as [`FulfillmentError::DuplicatePaymentReference`], which callers must treat as
    /// "already fulfilled, no-op" rather than as an error.
    async fn fulfill_cart(
        &self,
        customer_id: &str,
        cart_line_ids: &[i64],
        payment_reference: &str,
    ) -> Result<OrderGroup, FulfillmentError>;

    /// Fetch the order group for a payment reference, if fulfillment has completed for it. When `customer_id` is
    /// given, the lookup is scoped to that customer (the poller's visibility rule).
    async fn fetch_order_group_by_payment_reference(
        &self,
        payment_reference: &str,
        customer_id: Option<&str>,
    ) -> Result<Option<OrderGroup>, FulfillmentError>;

    /// Fetch the line items of an order group.
    async fn fetch_order_lines(&self, order_group_id: i64) -> Result<Vec<OrderLine>, FulfillmentError>;

    /// Fetch the batch consumption trail for an order line.
    async fn fetch_consumption_for_order(&self, order_id: i64) -> Result<Vec<BatchConsumption>, FulfillmentError>;

    /// Fetch the current snapshot (quantity and live unit price) of the given cart lines for a customer. Used by
    /// the ingestor to recompute the expected charge. Lines that do not exist or belong to another customer are
    /// simply absent from the result.
    async fn cart_snapshot(
        &self,
        customer_id: &str,
        cart_line_ids: &[i64],
    ) -> Result<Vec<CartLineSnapshot>, FulfillmentError>;

    /// Recompute the expected charge for the given cart lines: Σ quantity × current unit price.
    async fn expected_cart_total(
        &self,
        customer_id: &str,
        cart_line_ids: &[i64],
    ) -> Result<MinorUnits, FulfillmentError> {
        let snapshot = self.cart_snapshot(customer_id, cart_line_ids).await?;
        if snapshot.is_empty() {
            return Err(FulfillmentError::EmptyCart);
        }
        Ok(snapshot.iter().map(|line| line.line_total()).sum())
    }
}

#[derive(Debug, Clone, Error)]
pub enum FulfillmentError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("The cart has no lines to fulfill")]
    EmptyCart,
    #[error("Insufficient inventory for: {0}")]
    InsufficientInventory(String),
    #[error("An order group already exists for payment reference {0}")]
    DuplicatePaymentReference(String),
    #[error("The requested product {0} does not exist")]
    ProductNotFound(i64),
    #[error("No order group found for payment reference {0}")]
    OrderGroupNotFound(String),
    #[error("The fulfillment transaction exceeded its execution time limit")]
    Timeout,
}

impl FulfillmentError {
    /// Whether re-attempting the fulfillment could succeed. Inventory shortfalls and duplicates are terminal for
    /// the triggering event. Timeouts are worth one retry, and so is a busy database: SQLite reports a held
    /// write lock (`SQLITE_BUSY`) as "database is locked", and the lock is transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            FulfillmentError::Timeout => true,
            FulfillmentError::DatabaseError(msg) => msg.contains("database is locked"),
            _ => false,
        }
    }
}

impl From<sqlx::Error> for FulfillmentError {
    fn from(e: sqlx::Error) -> Self {
        FulfillmentError::DatabaseError(e.to_string())
    }
}

#[cfg(test)]
mod test {
    use super::FulfillmentError;

    #[test]
    fn busy_database_errors_are_retryable() {
        let busy = FulfillmentError::DatabaseError("error returned from database: (code: 5) database is locked".into());
        assert!(busy.is_retryable());
        assert!(FulfillmentError::Timeout.is_retryable());
        let terminal = FulfillmentError::DatabaseError("error returned from database: (code: 1) no such table".into());
        assert!(!terminal.is_retryable());
        assert!(!FulfillmentError::DuplicatePaymentReference("pay-1".into()).is_retryable());
    }
}
