//! Marketplace Fulfillment Engine
//!
//! The engine turns successful, asynchronously-notified payments into durable order records while atomically
//! depleting inventory that is subdivided into dated batches with independent quantities and expiry. This library
//! contains the core logic and is HTTP-framework agnostic.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`SqliteDatabase`]). SQLite is the supported backend. You should never need to
//!    access the database directly. Instead, use the public APIs. The exception is the data types used in the
//!    database, defined in the `db_types` module, which are public.
//! 2. Backend traits ([`mod@traits`]). A backend acts as the storage layer for the engine by implementing
//!    [`traits::FulfillmentDatabase`] and [`traits::InventoryManagement`].
//! 3. The public API ([`FulfillmentApi`] and [`InventoryApi`]). These wrap a backend and provide the
//!    fulfillment flow (with its execution timeout) and the batch-ledger operations.
//!
//! The load-bearing guarantees live in the backend: the fulfillment transaction is all-or-nothing, the
//! `payment_reference` uniqueness constraint makes order-group creation idempotent, and guarded decrements keep
//! batch and product quantities non-negative under concurrency.
pub mod allocation;
pub mod db_types;
pub mod helpers;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub mod test_utils;

mod fulfillment_api;
mod inventory_api;

#[cfg(feature = "sqlite")]
pub use sqlite::{run_migrations, SqliteDatabase};

pub use fulfillment_api::FulfillmentApi;
pub use inventory_api::InventoryApi;
pub use traits::{FulfillmentDatabase, FulfillmentError, InventoryError, InventoryManagement};
