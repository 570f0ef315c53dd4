// src/models/order_item.rs

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// One product/quantity/price entry within an order. Immutable after
/// creation; `unit_price_cents` is the historical price captured at
/// checkout, decoupled from the current catalog price.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderItem {
  pub id: Uuid,
  pub order_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i64,
  pub unit_price_cents: i64,
}
