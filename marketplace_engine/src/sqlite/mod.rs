//! SQLite backend for the marketplace engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;

/// Apply the engine's schema migrations to the given pool.
pub async fn run_migrations(pool: &sqlx::SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
