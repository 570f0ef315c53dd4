// src/services/orders.rs

//! Order-level operations: listing, staff status advancement, cancellation
//! and the order-level refund request.
//!
//! Every transition is a conditional UPDATE keyed on the expected current
//! status; two staff members racing on the same order lose cleanly with a
//! `Conflict` instead of silently overwriting each other. The delivery
//! mirror is written in the same transaction as the order status, always.

use crate::errors::{AppError, Result};
use crate::models::{Order, OrderStatus, ReturnStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

/// Days after the order date during which delivered orders are
/// refund/return eligible.
pub const RETURN_WINDOW_DAYS: i64 = 30;

pub(crate) fn within_return_window(order_date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
  now.signed_duration_since(order_date) <= chrono::Duration::days(RETURN_WINDOW_DAYS)
}

pub async fn get_order(pool: &SqlitePool, order_id: Uuid) -> Result<Order> {
  sqlx::query_as::<_, Order>(
    "SELECT id, user_id, created_at, status, total_amount_cents, shipping_address, billing_address \
     FROM orders WHERE id = ?",
  )
  .bind(order_id)
  .fetch_optional(pool)
  .await?
  .ok_or_else(|| AppError::NotFound(format!("order {} not found", order_id)))
}

/// Compare-and-set the order status and sync the delivery mirror, all within
/// the caller's transaction.
pub(crate) async fn transition_order(
  tx: &mut Transaction<'_, Sqlite>,
  order_id: Uuid,
  expected: OrderStatus,
  next: OrderStatus,
) -> Result<()> {
  let result = sqlx::query("UPDATE orders SET status = ? WHERE id = ? AND status = ?")
    .bind(next)
    .bind(order_id)
    .bind(expected)
    .execute(&mut **tx)
    .await?;

  if result.rows_affected() == 0 {
    let current = sqlx::query_scalar::<_, OrderStatus>("SELECT status FROM orders WHERE id = ?")
      .bind(order_id)
      .fetch_optional(&mut **tx)
      .await?;
    return Err(match current {
      None => AppError::NotFound(format!("order {} not found", order_id)),
      Some(status) => AppError::Conflict(format!(
        "order {} is '{}', expected '{}'",
        order_id,
        status.as_str(),
        expected.as_str()
      )),
    });
  }

  sync_delivery(tx, order_id, next).await
}

pub(crate) async fn sync_delivery(
  tx: &mut Transaction<'_, Sqlite>,
  order_id: Uuid,
  status: OrderStatus,
) -> Result<()> {
  sqlx::query("UPDATE deliveries SET status = ?, updated_at = ? WHERE order_id = ?")
    .bind(status.delivery_status())
    .bind(Utc::now())
    .bind(order_id)
    .execute(&mut **tx)
    .await?;
  Ok(())
}

/// Mirror a refund-path status onto the order and its delivery record
/// without ever downgrading an already refunded order.
pub(crate) async fn mirror_unless_refunded(
  tx: &mut Transaction<'_, Sqlite>,
  order_id: Uuid,
  next: OrderStatus,
) -> Result<()> {
  let result = sqlx::query("UPDATE orders SET status = ? WHERE id = ? AND status <> 'refunded'")
    .bind(next)
    .bind(order_id)
    .execute(&mut **tx)
    .await?;

  if result.rows_affected() > 0 {
    sync_delivery(tx, order_id, next).await?;
  }
  Ok(())
}

/// Mark the order and its delivery record refunded. Called from the return
/// decision reducer, after the refund record and restock have been written
/// to the same transaction.
pub(crate) async fn sync_order_refunded(tx: &mut Transaction<'_, Sqlite>, order_id: Uuid) -> Result<()> {
  sqlx::query("UPDATE orders SET status = ? WHERE id = ?")
    .bind(OrderStatus::Refunded)
    .bind(order_id)
    .execute(&mut **tx)
    .await?;
  sync_delivery(tx, order_id, OrderStatus::Refunded).await
}

#[derive(Debug, Serialize)]
pub struct StatusOutcome {
  pub order_id: Uuid,
  pub status: OrderStatus,
}

/// Single-step forward advancement (`processing → in_transit → delivered`).
/// No skipping; terminal and refund-path states do not advance.
pub async fn advance_status(pool: &SqlitePool, order_id: Uuid) -> Result<StatusOutcome> {
  let order = get_order(pool, order_id).await?;
  let next = order.status.next().ok_or_else(|| {
    AppError::Conflict(format!(
      "order {} cannot advance from '{}'",
      order_id,
      order.status.as_str()
    ))
  })?;

  let mut tx = pool.begin().await?;
  transition_order(&mut tx, order_id, order.status, next).await?;
  tx.commit().await?;

  tracing::info!(%order_id, status = next.as_str(), "Order advanced");
  Ok(StatusOutcome { order_id, status: next })
}

/// Staff override: set one of the three fulfilment states directly. The
/// cancel/refund states carry side effects and are reachable only through
/// their dedicated operations.
pub async fn set_status(pool: &SqlitePool, order_id: Uuid, target: OrderStatus) -> Result<StatusOutcome> {
  if !target.is_directly_settable() {
    return Err(AppError::Conflict(format!(
      "status '{}' cannot be set directly; use the cancel/refund operations",
      target.as_str()
    )));
  }

  let mut tx = pool.begin().await?;
  let result = sqlx::query(
    "UPDATE orders SET status = ? \
     WHERE id = ? AND status IN ('processing', 'in_transit', 'delivered')",
  )
  .bind(target)
  .bind(order_id)
  .execute(&mut *tx)
  .await?;

  if result.rows_affected() == 0 {
    let current = sqlx::query_scalar::<_, OrderStatus>("SELECT status FROM orders WHERE id = ?")
      .bind(order_id)
      .fetch_optional(&mut *tx)
      .await?;
    return Err(match current {
      None => AppError::NotFound(format!("order {} not found", order_id)),
      Some(status) => AppError::Conflict(format!(
        "order {} is '{}' and cannot be overridden",
        order_id,
        status.as_str()
      )),
    });
  }

  sync_delivery(&mut tx, order_id, target).await?;
  tx.commit().await?;

  tracing::info!(%order_id, status = target.as_str(), "Order status set by staff");
  Ok(StatusOutcome { order_id, status: target })
}

#[derive(Debug, Serialize)]
pub struct CancelOutcome {
  pub order_id: Uuid,
  pub user_id: Uuid,
  pub status: OrderStatus,
  pub total_amount_cents: i64,
}

/// Cancel an order that is still `processing`, restocking every line item
/// in the same transaction. Calling it twice is a `Conflict`; the restock
/// cannot be applied twice.
pub async fn cancel_order(pool: &SqlitePool, order_id: Uuid) -> Result<CancelOutcome> {
  let order = get_order(pool, order_id).await?;
  if order.status != OrderStatus::Processing {
    return Err(AppError::Conflict("Only processing orders can be cancelled".to_string()));
  }

  let mut tx = pool.begin().await?;
  transition_order(&mut tx, order_id, OrderStatus::Processing, OrderStatus::Cancelled).await?;
  crate::services::inventory::restock_order_items(&mut *tx, order_id).await?;
  tx.commit().await?;

  tracing::info!(%order_id, "Order cancelled and stock restored");
  Ok(CancelOutcome {
    order_id,
    user_id: order.user_id,
    status: OrderStatus::Cancelled,
    total_amount_cents: order.total_amount_cents,
  })
}

#[derive(Debug, Serialize)]
pub struct OrderRefundOutcome {
  pub order_id: Uuid,
  pub user_id: Uuid,
  pub status: OrderStatus,
  pub opened_returns: u64,
}

/// Staff-initiated order refund: parks a `delivered` order in
/// `refund_waiting` and opens a return request for every line item that
/// does not already have an active one. Decisions then proceed per item.
pub async fn request_order_refund(pool: &SqlitePool, order_id: Uuid) -> Result<OrderRefundOutcome> {
  let order = get_order(pool, order_id).await?;

  match order.status {
    OrderStatus::Delivered => {}
    OrderStatus::Cancelled => {
      return Err(AppError::Conflict("Cancelled orders cannot be refunded".to_string()));
    }
    OrderStatus::RefundWaiting | OrderStatus::Refunded | OrderStatus::RefundRejected => {
      return Err(AppError::Conflict("Refund already requested".to_string()));
    }
    OrderStatus::Processing | OrderStatus::InTransit => {
      return Err(AppError::Conflict("Only delivered orders can be refunded".to_string()));
    }
  }
  if !within_return_window(order.created_at, Utc::now()) {
    return Err(AppError::Conflict(format!(
      "Refunds are only available within {} days of the order date",
      RETURN_WINDOW_DAYS
    )));
  }

  let mut tx = pool.begin().await?;
  transition_order(&mut tx, order_id, OrderStatus::Delivered, OrderStatus::RefundWaiting).await?;

  // Items already carrying an active (non-rejected) request keep it; a
  // rejected request does not block a fresh one.
  let eligible_items: Vec<Uuid> = sqlx::query_scalar(
    "SELECT oi.id FROM order_items oi \
     WHERE oi.order_id = ? \
       AND NOT EXISTS ( \
         SELECT 1 FROM return_requests rr \
         WHERE rr.order_item_id = oi.id AND rr.status <> 'rejected' \
       )",
  )
  .bind(order_id)
  .fetch_all(&mut *tx)
  .await?;

  let now = Utc::now();
  for item_id in &eligible_items {
    sqlx::query(
      "INSERT INTO return_requests (id, order_item_id, user_id, reason, status, requested_at) \
       VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(Uuid::new_v4())
    .bind(item_id)
    .bind(order.user_id)
    .bind("Order refund requested")
    .bind(ReturnStatus::Requested)
    .bind(now)
    .execute(&mut *tx)
    .await?;
  }
  tx.commit().await?;

  tracing::info!(%order_id, opened = eligible_items.len(), "Order refund requested");
  Ok(OrderRefundOutcome {
    order_id,
    user_id: order.user_id,
    status: OrderStatus::RefundWaiting,
    opened_returns: eligible_items.len() as u64,
  })
}

// --- Listing ---

#[derive(Debug, Serialize)]
pub struct OrderItemView {
  pub order_item_id: Uuid,
  pub product_id: Uuid,
  pub product_name: String,
  pub quantity: i64,
  pub unit_price_cents: i64,
}

#[derive(Debug, Serialize)]
pub struct OrderView {
  pub order_id: Uuid,
  pub user_id: Uuid,
  pub order_date: DateTime<Utc>,
  pub total_amount_cents: i64,
  pub status: OrderStatus,
  pub status_label: &'static str,
  pub delivery_status: Option<crate::models::DeliveryStatus>,
  pub shipping_address: Option<String>,
  pub billing_address: Option<String>,
  pub items: Vec<OrderItemView>,
}

#[derive(FromRow)]
struct OrderListRow {
  id: Uuid,
  user_id: Uuid,
  created_at: DateTime<Utc>,
  status: OrderStatus,
  total_amount_cents: i64,
  shipping_address: Option<String>,
  billing_address: Option<String>,
  delivery_status: Option<crate::models::DeliveryStatus>,
}

#[derive(FromRow)]
struct ItemListRow {
  id: Uuid,
  order_id: Uuid,
  product_id: Uuid,
  quantity: i64,
  unit_price_cents: i64,
  product_name: Option<String>,
}

/// Orders with embedded line items and the normalized status label, newest
/// first; optionally filtered to a single user.
pub async fn list_orders(pool: &SqlitePool, user_id: Option<Uuid>) -> Result<Vec<OrderView>> {
  let orders = sqlx::query_as::<_, OrderListRow>(
    "SELECT o.id, o.user_id, o.created_at, o.status, o.total_amount_cents, \
            o.shipping_address, o.billing_address, d.status AS delivery_status \
     FROM orders o LEFT JOIN deliveries d ON d.order_id = o.id \
     WHERE (?1 IS NULL OR o.user_id = ?1) \
     ORDER BY o.created_at DESC",
  )
  .bind(user_id)
  .fetch_all(pool)
  .await?;

  let items = sqlx::query_as::<_, ItemListRow>(
    "SELECT oi.id, oi.order_id, oi.product_id, oi.quantity, oi.unit_price_cents, \
            p.name AS product_name \
     FROM order_items oi \
     JOIN orders o ON o.id = oi.order_id \
     LEFT JOIN products p ON p.id = oi.product_id \
     WHERE (?1 IS NULL OR o.user_id = ?1)",
  )
  .bind(user_id)
  .fetch_all(pool)
  .await?;

  let mut item_map: HashMap<Uuid, Vec<OrderItemView>> = HashMap::new();
  for row in items {
    item_map.entry(row.order_id).or_default().push(OrderItemView {
      order_item_id: row.id,
      product_id: row.product_id,
      product_name: row
        .product_name
        .unwrap_or_else(|| format!("Product {}", row.product_id)),
      quantity: row.quantity,
      unit_price_cents: row.unit_price_cents,
    });
  }

  Ok(
    orders
      .into_iter()
      .map(|row| OrderView {
        order_id: row.id,
        user_id: row.user_id,
        order_date: row.created_at,
        total_amount_cents: row.total_amount_cents,
        status: row.status,
        status_label: row.status.label(),
        delivery_status: row.delivery_status,
        shipping_address: row.shipping_address,
        billing_address: row.billing_address,
        items: item_map.remove(&row.id).unwrap_or_default(),
      })
      .collect(),
  )
}
