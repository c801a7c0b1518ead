use std::fmt::Display;

use chrono::{DateTime, Utc};
use marketplace_engine::db_types::{OrderGroup, OrderGroupStatus};
use mp_common::MinorUnits;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

//--------------------------------   Payment confirmation event   -----------------------------------------------------
/// The inbound gateway event. The raw body is signed with the shared webhook secret; the declared amount is in
/// minor currency units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfirmationEvent {
    pub event: String,
    pub data: PaymentConfirmationData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfirmationData {
    /// Declared transaction status. Anything other than "success" is acknowledged without fulfillment.
    pub status: String,
    /// The gateway-issued payment reference. The idempotency key for fulfillment.
    pub reference: String,
    /// Amount paid, in minor currency units.
    pub amount: i64,
    pub metadata: PaymentMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMetadata {
    pub customer_id: String,
    pub cart_line_ids: Vec<i64>,
}

impl PaymentConfirmationData {
    pub fn is_successful(&self) -> bool {
        self.status.eq_ignore_ascii_case("success")
    }

    pub fn amount(&self) -> MinorUnits {
        MinorUnits::from(self.amount)
    }
}

//--------------------------------     Confirmation poller result     -------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationStatusResult {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_group: Option<OrderGroupSummary>,
}

impl ConfirmationStatusResult {
    pub fn not_found() -> Self {
        Self { found: false, order_group: None }
    }

    pub fn found(group: OrderGroup) -> Self {
        Self { found: true, order_group: Some(group.into()) }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderGroupSummary {
    pub reference: String,
    pub status: OrderGroupStatus,
    pub total: MinorUnits,
    pub created_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl From<OrderGroup> for OrderGroupSummary {
    fn from(group: OrderGroup) -> Self {
        Self {
            reference: group.reference,
            status: group.status,
            total: group.total,
            created_at: group.created_at,
            delivered_at: group.delivered_at,
        }
    }
}
