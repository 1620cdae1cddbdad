//! # Database Persistence
//!
//! Postgres adapters for durable state. Each resource module exposes
//! insert/update/delete plus `load_all` for startup hydration; the
//! properties module additionally implements the query pipeline's
//! `PropertyStore` contract by compiling filter criteria into SQL.
//!
//! The pool is optional end to end: without `DATABASE_URL` the API runs
//! in-memory only.

pub mod activity;
pub mod customers;
pub mod properties;
pub mod users;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Schema DDL, applied idempotently at startup. This is deliberately
/// plain `CREATE TABLE IF NOT EXISTS` — the platform carries no
/// migration tooling.
const SCHEMA: &str = include_str!("schema.sql");

/// Initialize the connection pool from `DATABASE_URL`.
///
/// Returns `Ok(None)` when the variable is unset (in-memory mode) and
/// `Err` when it is set but the database is unreachable — a configured
/// database that cannot be reached is a startup failure, not a silent
/// downgrade.
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        tracing::info!("DATABASE_URL not set — running without persistence");
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await?;

    sqlx::raw_sql(SCHEMA).execute(&pool).await?;
    tracing::info!("database pool initialized");
    Ok(Some(pool))
}
