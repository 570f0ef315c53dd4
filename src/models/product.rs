// src/models/product.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// The stock-ledger slice of the catalog. Pricing and discounts live in the
/// catalog component; this subsystem only reads `price_cents` as the
/// checkout-time fallback when lines come from the stored cart.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
  pub id: Uuid,
  pub name: String,
  pub price_cents: i64,
  pub stock_quantity: i64,
  pub created_at: DateTime<Utc>,
}
