use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use mp_common::MinorUnits;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------      Product       ----------------------------------------------------------
/// A catalog item. `quantity` is the cached aggregate of the product's active, non-deleted batches and is maintained
/// by every mutation path rather than recomputed lazily.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub unit_price: MinorUnits,
    pub quantity: i64,
    pub vendor_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub unit_price: MinorUnits,
    pub vendor_id: String,
}

impl NewProduct {
    pub fn new<S: Into<String>>(name: S, unit_price: MinorUnits, vendor_id: S) -> Self {
        Self { name: name.into(), unit_price, vendor_id: vendor_id.into() }
    }
}

//--------------------------------------       Batch        ----------------------------------------------------------
/// A dated inventory lot for a product. Batches are consumed oldest-first during fulfillment, and are never
/// physically deleted once any consumption is recorded against them.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Batch {
    pub id: i64,
    /// Human-readable batch code. Unique across all batches (storage-level constraint).
    pub code: String,
    pub product_id: i64,
    /// Remaining quantity in this lot. Never negative.
    pub remaining: i64,
    pub cost_basis: MinorUnits,
    pub expires_on: Option<NaiveDate>,
    pub active: bool,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBatch {
    pub product_id: i64,
    pub quantity: i64,
    pub cost_basis: MinorUnits,
    pub expires_on: Option<NaiveDate>,
}

impl NewBatch {
    pub fn new(product_id: i64, quantity: i64, cost_basis: MinorUnits) -> Self {
        Self { product_id, quantity, cost_basis, expires_on: None }
    }

    pub fn with_expiry(mut self, expires_on: NaiveDate) -> Self {
        self.expires_on = Some(expires_on);
        self
    }
}

//--------------------------------------     Cart line      ----------------------------------------------------------
/// A pre-checkout cart entry. Cart lines are ephemeral: they are created when a customer adds a product to their
/// cart and deleted inside the fulfillment transaction once fully allocated.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CartLine {
    pub id: i64,
    pub customer_id: String,
    pub product_id: i64,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

/// A cart line joined with the current state of its product. This is the view the fulfillment transaction and the
/// ingestor's amount check work from; it must be fetched within the same transaction scope as any mutation that
/// relies on it.
#[derive(Debug, Clone, FromRow)]
pub struct CartLineSnapshot {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: MinorUnits,
}

impl CartLineSnapshot {
    pub fn line_total(&self) -> MinorUnits {
        self.unit_price * self.quantity
    }
}

//--------------------------------------  OrderGroupStatus  ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderGroupStatus {
    /// The order group was created by a successful fulfillment. This is the status every group is born with.
    Fulfilled,
    /// The goods have been handed to the customer.
    Delivered,
}

impl Display for OrderGroupStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderGroupStatus::Fulfilled => write!(f, "Fulfilled"),
            OrderGroupStatus::Delivered => write!(f, "Delivered"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order group status: {0}")]
pub struct StatusConversionError(String);

impl FromStr for OrderGroupStatus {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Fulfilled" => Ok(Self::Fulfilled),
            "Delivered" => Ok(Self::Delivered),
            s => Err(StatusConversionError(s.to_string())),
        }
    }
}

//--------------------------------------    Order group     ----------------------------------------------------------
/// The checkout-level aggregate tying one payment to its line items. At most one order group exists per payment
/// reference; the storage layer enforces this with a uniqueness constraint, which is the idempotency anchor for
/// the whole fulfillment flow.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderGroup {
    pub id: i64,
    /// Short human-presentable reference code. Unique.
    pub reference: String,
    pub customer_id: String,
    /// The gateway-issued identifier correlating the payment event to this checkout. Unique.
    pub payment_reference: String,
    pub total: MinorUnits,
    pub status: OrderGroupStatus,
    pub created_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
}

//--------------------------------------    Order line      ----------------------------------------------------------
/// A single line item of an order group. Immutable once created.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: i64,
    pub order_group_id: i64,
    pub product_id: i64,
    pub quantity_requested: i64,
    pub quantity_allocated: i64,
    /// Unit price at the time of purchase, not the live catalog price.
    pub unit_price: MinorUnits,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------  Batch consumption ----------------------------------------------------------
/// Audit row linking one order line to a batch it drew stock from. The consumption rows for an order line sum
/// exactly to that line's allocated quantity.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BatchConsumption {
    pub id: i64,
    pub order_id: i64,
    pub batch_id: i64,
    pub quantity: i64,
}
