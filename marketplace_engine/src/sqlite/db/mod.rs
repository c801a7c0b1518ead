//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interactions are maintained by simple functions (rather than stateful structs) that accept a
//! `&mut SqliteConnection` argument. Callers can obtain a connection from a pool, or create an atomic transaction
//! as the need arises and call through to the functions without any other changes.
use std::{str::FromStr, time::Duration};

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod batches;
pub mod cart;
pub mod order_groups;
pub mod orders;
pub mod products;

/// Open the engine's connection pool.
///
/// SQLite permits a single writer at a time. The pool is capped at one connection so that concurrent
/// transactions queue at the pool rather than overlapping on separate connections, where a deferred transaction
/// that upgrades to a write mid-flight aborts with `SQLITE_BUSY_SNAPSHOT`. A single connection also guarantees
/// that a committed write is visible to the very next read.
pub async fn new_pool(url: &str) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(30));
    let pool = SqlitePoolOptions::new().max_connections(1).connect_with(options).await?;
    Ok(pool)
}

/// True when the error is a UNIQUE constraint violation involving the given column (e.g.
/// `"order_groups.payment_reference"`). SQLite reports the offending column in the error message.
pub(crate) fn unique_violation_on(e: &SqlxError, column: &str) -> bool {
    match e {
        SqlxError::Database(db) => {
            let msg = db.message();
            msg.contains("UNIQUE constraint failed") && msg.contains(column)
        },
        _ => false,
    }
}
