// src/db.rs

//! Pool construction and schema bootstrap.
//!
//! The engine owns its tables and creates them on startup; everything it
//! needs from the catalog side is the stock ledger slice of `products`.

use crate::errors::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;

pub async fn connect(database_url: &str) -> Result<SqlitePool> {
  let options = SqliteConnectOptions::from_str(database_url)?
    .create_if_missing(true)
    .journal_mode(SqliteJournalMode::Wal)
    .busy_timeout(Duration::from_secs(5))
    .foreign_keys(true);

  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect_with(options)
    .await?;
  Ok(pool)
}

/// Single-connection in-memory pool. Used by the test suite and by local
/// experimentation; a shared in-memory SQLite database only exists for the
/// lifetime of its one connection, so the pool must not grow past it.
pub async fn connect_in_memory() -> Result<SqlitePool> {
  let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
  let pool = SqlitePoolOptions::new()
    .max_connections(1)
    .connect_with(options)
    .await?;
  Ok(pool)
}

const SCHEMA: &[&str] = &[
  r#"
  CREATE TABLE IF NOT EXISTS products (
    id             BLOB PRIMARY KEY,
    name           TEXT NOT NULL,
    price_cents    INTEGER NOT NULL,
    stock_quantity INTEGER NOT NULL DEFAULT 0,
    created_at     TEXT NOT NULL
  )
  "#,
  r#"
  CREATE TABLE IF NOT EXISTS cart_items (
    id         BLOB PRIMARY KEY,
    user_id    BLOB NOT NULL,
    product_id BLOB NOT NULL REFERENCES products(id),
    quantity   INTEGER NOT NULL,
    added_at   TEXT NOT NULL
  )
  "#,
  r#"
  CREATE TABLE IF NOT EXISTS orders (
    id                 BLOB PRIMARY KEY,
    user_id            BLOB NOT NULL,
    created_at         TEXT NOT NULL,
    status             TEXT NOT NULL,
    total_amount_cents INTEGER NOT NULL,
    shipping_address   TEXT,
    billing_address    TEXT
  )
  "#,
  r#"
  CREATE TABLE IF NOT EXISTS order_items (
    id               BLOB PRIMARY KEY,
    order_id         BLOB NOT NULL REFERENCES orders(id),
    product_id       BLOB NOT NULL,
    quantity         INTEGER NOT NULL,
    unit_price_cents INTEGER NOT NULL
  )
  "#,
  r#"
  CREATE TABLE IF NOT EXISTS deliveries (
    id         BLOB PRIMARY KEY,
    order_id   BLOB NOT NULL UNIQUE REFERENCES orders(id),
    user_id    BLOB NOT NULL,
    status     TEXT NOT NULL,
    carrier    TEXT,
    updated_at TEXT NOT NULL
  )
  "#,
  r#"
  CREATE TABLE IF NOT EXISTS invoices (
    id           BLOB PRIMARY KEY,
    order_id     BLOB NOT NULL REFERENCES orders(id),
    amount_cents INTEGER NOT NULL,
    status       TEXT NOT NULL,
    issued_at    TEXT NOT NULL
  )
  "#,
  r#"
  CREATE TABLE IF NOT EXISTS return_requests (
    id            BLOB PRIMARY KEY,
    order_item_id BLOB NOT NULL REFERENCES order_items(id),
    user_id       BLOB NOT NULL,
    reason        TEXT,
    status        TEXT NOT NULL,
    requested_at  TEXT NOT NULL,
    processed_at  TEXT
  )
  "#,
  r#"
  CREATE TABLE IF NOT EXISTS payments (
    id              BLOB PRIMARY KEY,
    order_id        BLOB NOT NULL REFERENCES orders(id),
    user_id         BLOB NOT NULL,
    amount_cents    INTEGER NOT NULL,
    method          TEXT NOT NULL,
    status          TEXT NOT NULL,
    paid_at         TEXT,
    transaction_ref TEXT,
    card_holder_enc TEXT,
    card_number_enc TEXT,
    card_expiry_enc TEXT,
    card_last4      TEXT,
    created_at      TEXT NOT NULL
  )
  "#,
  r#"
  CREATE UNIQUE INDEX IF NOT EXISTS idx_payments_order_txn
    ON payments(order_id, transaction_ref)
    WHERE transaction_ref IS NOT NULL
  "#,
  r#"
  CREATE TABLE IF NOT EXISTS refunds (
    id           BLOB PRIMARY KEY,
    payment_id   BLOB NOT NULL REFERENCES payments(id),
    return_id    BLOB NOT NULL UNIQUE REFERENCES return_requests(id),
    amount_cents INTEGER NOT NULL,
    status       TEXT NOT NULL,
    processed_at TEXT NOT NULL
  )
  "#,
];

pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
  for statement in SCHEMA {
    sqlx::query(statement).execute(pool).await?;
  }
  tracing::info!("Database schema is up to date.");
  Ok(())
}
