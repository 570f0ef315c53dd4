// src/services/checkout.rs

//! Checkout: one transaction covering order + line items + stock
//! reservation + invoice stub + delivery record + cart clearing. Any
//! failure — most importantly an insufficient stock decrement — rolls the
//! whole attempt back; there is no partially created order.

use crate::errors::{AppError, Result};
use crate::models::{DeliveryStatus, OrderStatus};
use crate::services::inventory;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, FromRow)]
pub struct CheckoutLine {
  pub product_id: Uuid,
  pub quantity: i64,
  pub unit_price_cents: i64,
}

#[derive(Debug, Serialize)]
pub struct CheckoutOutcome {
  pub order_id: Uuid,
  pub total_amount_cents: i64,
  pub order_status: OrderStatus,
  pub delivery_status: DeliveryStatus,
}

/// Create an order for `user_id`.
///
/// `lines` may be empty, in which case the user's stored cart (joined to
/// current catalog prices) is the line source. An empty resolved line set is
/// a validation error, not an empty order.
pub async fn checkout(
  pool: &SqlitePool,
  user_id: Uuid,
  mut lines: Vec<CheckoutLine>,
  shipping_address: Option<&serde_json::Value>,
  billing_address: Option<&serde_json::Value>,
  shipping_fee_cents: i64,
) -> Result<CheckoutOutcome> {
  if lines.is_empty() {
    lines = sqlx::query_as::<_, CheckoutLine>(
      "SELECT ci.product_id, ci.quantity, p.price_cents AS unit_price_cents \
       FROM cart_items ci JOIN products p ON p.id = ci.product_id \
       WHERE ci.user_id = ?",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
  }

  if lines.is_empty() {
    return Err(AppError::Validation("cart is empty".to_string()));
  }
  for line in &lines {
    if line.quantity <= 0 {
      return Err(AppError::Validation(format!(
        "quantity for product {} must be a positive integer",
        line.product_id
      )));
    }
    if line.unit_price_cents < 0 {
      return Err(AppError::Validation(format!(
        "unit price for product {} must not be negative",
        line.product_id
      )));
    }
  }
  if shipping_fee_cents < 0 {
    return Err(AppError::Validation("shipping fee must not be negative".to_string()));
  }

  let shipping_payload = normalize_address_payload(shipping_address);
  let billing_payload = normalize_address_payload(billing_address);
  if shipping_payload.is_none() {
    return Err(AppError::Validation("shipping address is required".to_string()));
  }

  // Quantities and prices are client-supplied; the total must not wrap.
  let mut total_amount_cents: i64 = shipping_fee_cents;
  for line in &lines {
    let line_total = line.quantity.checked_mul(line.unit_price_cents).ok_or_else(|| {
      AppError::Validation(format!("order total overflows for product {}", line.product_id))
    })?;
    total_amount_cents = total_amount_cents
      .checked_add(line_total)
      .ok_or_else(|| AppError::Validation("order total overflows".to_string()))?;
  }

  let order_id = Uuid::new_v4();
  let now = Utc::now();

  let mut tx = pool.begin().await?;

  sqlx::query(
    "INSERT INTO orders (id, user_id, created_at, status, total_amount_cents, shipping_address, billing_address) \
     VALUES (?, ?, ?, ?, ?, ?, ?)",
  )
  .bind(order_id)
  .bind(user_id)
  .bind(now)
  .bind(OrderStatus::Processing)
  .bind(total_amount_cents)
  .bind(&shipping_payload)
  .bind(&billing_payload)
  .execute(&mut *tx)
  .await?;

  for line in &lines {
    sqlx::query(
      "INSERT INTO order_items (id, order_id, product_id, quantity, unit_price_cents) \
       VALUES (?, ?, ?, ?, ?)",
    )
    .bind(Uuid::new_v4())
    .bind(order_id)
    .bind(line.product_id)
    .bind(line.quantity)
    .bind(line.unit_price_cents)
    .execute(&mut *tx)
    .await?;

    // Rolls back the entire checkout when any single line oversells.
    inventory::reserve(&mut *tx, line.product_id, line.quantity).await?;
  }

  sqlx::query("INSERT INTO invoices (id, order_id, amount_cents, status, issued_at) VALUES (?, ?, ?, 'issued', ?)")
    .bind(Uuid::new_v4())
    .bind(order_id)
    .bind(total_amount_cents)
    .bind(now)
    .execute(&mut *tx)
    .await?;

  sqlx::query("INSERT INTO deliveries (id, order_id, user_id, status, updated_at) VALUES (?, ?, ?, ?, ?)")
    .bind(Uuid::new_v4())
    .bind(order_id)
    .bind(user_id)
    .bind(DeliveryStatus::Preparing)
    .bind(now)
    .execute(&mut *tx)
    .await?;

  sqlx::query("DELETE FROM cart_items WHERE user_id = ?")
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

  tx.commit().await?;

  tracing::info!(%order_id, %user_id, total_amount_cents, "Checkout committed");

  Ok(CheckoutOutcome {
    order_id,
    total_amount_cents,
    order_status: OrderStatus::Processing,
    delivery_status: DeliveryStatus::Preparing,
  })
}

/// Addresses are pass-through: structured payloads are stored as their JSON
/// serialization, plain strings as-is. This subsystem never parses them
/// beyond that.
fn normalize_address_payload(value: Option<&serde_json::Value>) -> Option<String> {
  match value {
    None | Some(serde_json::Value::Null) => None,
    Some(serde_json::Value::String(s)) if s.trim().is_empty() => None,
    Some(serde_json::Value::String(s)) => Some(s.clone()),
    Some(other) => Some(other.to_string()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn structured_addresses_are_stored_as_json() {
    let value = json!({"name": "A. Customer", "city": "Istanbul", "postal_code": "34000"});
    let stored = normalize_address_payload(Some(&value)).expect("payload");
    let round: serde_json::Value = serde_json::from_str(&stored).expect("valid json");
    assert_eq!(round["city"], "Istanbul");
  }

  #[test]
  fn plain_and_empty_strings() {
    assert_eq!(
      normalize_address_payload(Some(&json!("12 Main St"))),
      Some("12 Main St".to_string())
    );
    assert_eq!(normalize_address_payload(Some(&json!(""))), None);
    assert_eq!(normalize_address_payload(Some(&serde_json::Value::Null)), None);
    assert_eq!(normalize_address_payload(None), None);
  }
}
