//! Backend traits for the marketplace engine.
//!
//! A storage backend acts as the engine's persistence layer by implementing these traits. The SQLite backend in
//! [`crate::SqliteDatabase`] is the reference implementation.
mod fulfillment_database;
mod inventory_management;

pub use fulfillment_database::{FulfillmentDatabase, FulfillmentError};
pub use inventory_management::{InventoryError, InventoryManagement};
