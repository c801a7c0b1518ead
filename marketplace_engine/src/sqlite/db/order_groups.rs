use log::{debug, warn};
use mp_common::MinorUnits;
use sqlx::SqliteConnection;

use super::unique_violation_on;
use crate::{db_types::OrderGroup, helpers, traits::FulfillmentError};

/// Inserts the order group for a payment reference, generating a fresh unique reference code and regenerating on
/// collision (generate-and-probe; the loop has no hard upper bound and logs a warning when it spins).
///
/// A uniqueness violation on `payment_reference` means another fulfillment already committed for this payment. It
/// is surfaced as [`FulfillmentError::DuplicatePaymentReference`] so callers can resolve it as a no-op. This
/// constraint, not any caller-side existence check, is the idempotency guarantee.
pub async fn insert_order_group(
    customer_id: &str,
    payment_reference: &str,
    total: MinorUnits,
    conn: &mut SqliteConnection,
) -> Result<OrderGroup, FulfillmentError> {
    let mut attempts = 0u32;
    loop {
        let reference = helpers::generate(helpers::DEFAULT_ORDER_REFERENCE_LENGTH);
        let result = sqlx::query_as::<_, OrderGroup>(
            r#"
                INSERT INTO order_groups (reference, customer_id, payment_reference, total, status)
                VALUES ($1, $2, $3, $4, 'Fulfilled')
                RETURNING *;
            "#,
        )
        .bind(&reference)
        .bind(customer_id)
        .bind(payment_reference)
        .bind(total)
        .fetch_one(&mut *conn)
        .await;
        match result {
            Ok(group) => {
                debug!("🧾️ Order group [{}] inserted with id {} for payment {payment_reference}", group.reference, group.id);
                return Ok(group);
            },
            Err(e) if unique_violation_on(&e, "order_groups.payment_reference") => {
                return Err(FulfillmentError::DuplicatePaymentReference(payment_reference.to_string()));
            },
            Err(e) if unique_violation_on(&e, "order_groups.reference") => {
                attempts += 1;
                if attempts >= crate::helpers::COLLISION_WARN_THRESHOLD {
                    warn!("🧾️ Order reference collision retry #{attempts} for payment {payment_reference}");
                }
            },
            Err(e) => return Err(e.into()),
        }
    }
}

pub async fn fetch_by_payment_reference(
    payment_reference: &str,
    customer_id: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderGroup>, sqlx::Error> {
    let group = match customer_id {
        Some(cid) => {
            sqlx::query_as("SELECT * FROM order_groups WHERE payment_reference = $1 AND customer_id = $2")
                .bind(payment_reference)
                .bind(cid)
                .fetch_optional(conn)
                .await?
        },
        None => {
            sqlx::query_as("SELECT * FROM order_groups WHERE payment_reference = $1")
                .bind(payment_reference)
                .fetch_optional(conn)
                .await?
        },
    };
    Ok(group)
}
