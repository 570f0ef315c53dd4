// src/services/returns.rs

//! Per-line-item return workflow.
//!
//! Two entry points converge here: a customer opening a return on a single
//! delivered item, and the staff-level order refund (which synthesizes one
//! request per eligible item, see `services::orders`). Both settle through
//! the same decision reducer, so a line is never restocked or refunded
//! twice no matter which path opened it.

use crate::errors::{AppError, Result};
use crate::models::{DeliveryStatus, OrderStatus, ReturnStatus};
use crate::services::orders::{mirror_unless_refunded, transition_order, within_return_window, RETURN_WINDOW_DAYS};
use crate::services::inventory;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct ReturnOutcome {
  pub return_id: Uuid,
  pub order_item_id: Uuid,
  pub status: ReturnStatus,
}

#[derive(FromRow)]
struct ItemLookupRow {
  order_id: Uuid,
  order_created_at: DateTime<Utc>,
  order_status: OrderStatus,
}

/// Customer-initiated return on a single delivered line item. Pushes the
/// parent order into `refund_waiting` even though only one item is
/// contested; order status does not partition per item.
///
/// A parent order already parked in `refund_waiting` (another line under
/// review) or `refund_rejected` (a prior request was turned down) still
/// accepts new requests; only the per-item active-request check and the
/// window gate what can be opened.
pub async fn request_item_return(
  pool: &SqlitePool,
  user_id: Uuid,
  order_item_id: Uuid,
  reason: Option<String>,
) -> Result<ReturnOutcome> {
  let reason = reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());

  let row = sqlx::query_as::<_, ItemLookupRow>(
    "SELECT oi.order_id, o.created_at AS order_created_at, o.status AS order_status \
     FROM order_items oi JOIN orders o ON o.id = oi.order_id \
     WHERE oi.id = ? AND o.user_id = ?",
  )
  .bind(order_item_id)
  .bind(user_id)
  .fetch_optional(pool)
  .await?
  .ok_or_else(|| AppError::NotFound(format!("order item {} not found", order_item_id)))?;

  match row.order_status {
    OrderStatus::Delivered | OrderStatus::RefundWaiting | OrderStatus::RefundRejected => {}
    _ => {
      return Err(AppError::Conflict("Only delivered items can be returned".to_string()));
    }
  }
  if !within_return_window(row.order_created_at, Utc::now()) {
    return Err(AppError::Conflict(format!(
      "Return window expired ({} days after the order date)",
      RETURN_WINDOW_DAYS
    )));
  }

  let mut tx = pool.begin().await?;

  let active: i64 = sqlx::query_scalar(
    "SELECT COUNT(*) FROM return_requests WHERE order_item_id = ? AND status <> 'rejected'",
  )
  .bind(order_item_id)
  .fetch_one(&mut *tx)
  .await?;
  if active > 0 {
    return Err(AppError::Conflict("Return already requested for this item".to_string()));
  }

  let return_id = Uuid::new_v4();
  sqlx::query(
    "INSERT INTO return_requests (id, order_item_id, user_id, reason, status, requested_at) \
     VALUES (?, ?, ?, ?, ?, ?)",
  )
  .bind(return_id)
  .bind(order_item_id)
  .bind(user_id)
  .bind(&reason)
  .bind(ReturnStatus::Requested)
  .bind(Utc::now())
  .execute(&mut *tx)
  .await?;

  transition_order(&mut tx, row.order_id, row.order_status, OrderStatus::RefundWaiting).await?;
  tx.commit().await?;

  tracing::info!(%return_id, %order_item_id, "Return request opened");
  Ok(ReturnOutcome {
    return_id,
    order_item_id,
    status: ReturnStatus::Requested,
  })
}

#[derive(Debug, Serialize)]
pub struct RefundIssued {
  pub refund_id: Uuid,
  pub payment_id: Uuid,
  pub amount_cents: i64,
}

#[derive(Debug, Serialize)]
pub struct DecisionOutcome {
  pub return_id: Uuid,
  pub order_id: Uuid,
  pub user_id: Uuid,
  pub status: ReturnStatus,
  /// Present only when the decision was `refunded`.
  pub refund: Option<RefundIssued>,
}

#[derive(FromRow)]
struct DecisionLookupRow {
  return_status: ReturnStatus,
  order_item_id: Uuid,
  user_id: Uuid,
  order_id: Uuid,
  product_id: Uuid,
  quantity: i64,
  unit_price_cents: i64,
}

/// Staff decision on a return request.
///
/// `refunded` restocks the item quantity, requires a resolvable payment for
/// the parent order, writes exactly one refund record and mirrors the order
/// to `refunded` — all in one transaction. Rejection alone restocks
/// nothing. Re-issuing a decision against a settled request is a
/// `Conflict`, so side effects cannot be applied twice.
pub async fn decide_return(pool: &SqlitePool, return_id: Uuid, decision: ReturnStatus) -> Result<DecisionOutcome> {
  if decision == ReturnStatus::Requested {
    return Err(AppError::Validation("'requested' is not a decision".to_string()));
  }

  let row = sqlx::query_as::<_, DecisionLookupRow>(
    "SELECT rr.status AS return_status, rr.order_item_id, rr.user_id, \
            oi.order_id, oi.product_id, oi.quantity, oi.unit_price_cents \
     FROM return_requests rr \
     JOIN order_items oi ON oi.id = rr.order_item_id \
     WHERE rr.id = ?",
  )
  .bind(return_id)
  .fetch_optional(pool)
  .await?
  .ok_or_else(|| AppError::NotFound(format!("return request {} not found", return_id)))?;

  if !row.return_status.can_become(decision) {
    return Err(AppError::Conflict(format!(
      "return {} cannot go from '{}' to '{}'",
      return_id,
      row.return_status.as_str(),
      decision.as_str()
    )));
  }

  let mut tx = pool.begin().await?;

  // CAS on the status we just read; a concurrent decision loses here.
  let updated = sqlx::query(
    "UPDATE return_requests SET status = ?, processed_at = ? WHERE id = ? AND status = ?",
  )
  .bind(decision)
  .bind(Utc::now())
  .bind(return_id)
  .bind(row.return_status)
  .execute(&mut *tx)
  .await?;
  if updated.rows_affected() == 0 {
    return Err(AppError::Conflict(format!(
      "return {} was updated concurrently",
      return_id
    )));
  }

  let mut refund = None;
  match decision {
    ReturnStatus::Accepted => {
      mirror_unless_refunded(&mut tx, row.order_id, OrderStatus::RefundWaiting).await?;
    }
    ReturnStatus::Rejected => {
      mirror_unless_refunded(&mut tx, row.order_id, OrderStatus::RefundRejected).await?;
    }
    ReturnStatus::Received => {
      // Goods are physically back; order status is untouched until the
      // refund decision.
    }
    ReturnStatus::Refunded => {
      refund = Some(issue_refund(&mut tx, return_id, &row).await?);
    }
    ReturnStatus::Requested => unreachable!("rejected above"),
  }

  tx.commit().await?;

  tracing::info!(%return_id, decision = decision.as_str(), "Return request decided");
  Ok(DecisionOutcome {
    return_id,
    order_id: row.order_id,
    user_id: row.user_id,
    status: decision,
    refund,
  })
}

async fn issue_refund(
  tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
  return_id: Uuid,
  row: &DecisionLookupRow,
) -> Result<RefundIssued> {
  inventory::restock(&mut **tx, row.product_id, row.quantity).await?;

  // A refund must reference the charge it reverses; with no payment on
  // record the whole decision rolls back and the caller is told why.
  let payment_id: Option<Uuid> = sqlx::query_scalar(
    "SELECT id FROM payments WHERE order_id = ? \
     ORDER BY paid_at DESC, created_at DESC LIMIT 1",
  )
  .bind(row.order_id)
  .fetch_optional(&mut **tx)
  .await?;
  let payment_id = payment_id.ok_or_else(|| {
    AppError::Conflict(format!("no payment recorded for order {}", row.order_id))
  })?;

  let refund_id = Uuid::new_v4();
  let amount_cents = row.quantity * row.unit_price_cents;
  let inserted = sqlx::query(
    "INSERT INTO refunds (id, payment_id, return_id, amount_cents, status, processed_at) \
     VALUES (?, ?, ?, ?, 'completed', ?)",
  )
  .bind(refund_id)
  .bind(payment_id)
  .bind(return_id)
  .bind(amount_cents)
  .bind(Utc::now())
  .execute(&mut **tx)
  .await;

  if let Err(err) = inserted {
    // UNIQUE(return_id): some other path already refunded this request.
    if err
      .as_database_error()
      .map(|db| db.is_unique_violation())
      .unwrap_or(false)
    {
      return Err(AppError::Conflict(format!(
        "return {} has already been refunded",
        return_id
      )));
    }
    return Err(err.into());
  }

  crate::services::orders::sync_order_refunded(tx, row.order_id).await?;

  Ok(RefundIssued {
    refund_id,
    payment_id,
    amount_cents,
  })
}

// --- Listing ---

#[derive(Debug, Serialize)]
pub struct ReturnRequestView {
  pub return_id: Uuid,
  pub order_item_id: Uuid,
  pub order_id: Uuid,
  pub user_id: Uuid,
  pub product_id: Uuid,
  pub product_name: String,
  pub quantity: i64,
  pub unit_price_cents: i64,
  pub reason: Option<String>,
  pub return_status: ReturnStatus,
  pub order_status: OrderStatus,
  pub delivery_status: Option<DeliveryStatus>,
  pub order_date: DateTime<Utc>,
  /// Whether a fresh return would still be accepted for this line today:
  /// delivered (or already in the refund path) and inside the window.
  pub return_eligible: bool,
  pub requested_at: DateTime<Utc>,
  pub processed_at: Option<DateTime<Utc>>,
}

#[derive(FromRow)]
struct ReturnListRow {
  return_id: Uuid,
  order_item_id: Uuid,
  order_id: Uuid,
  user_id: Uuid,
  product_id: Uuid,
  product_name: Option<String>,
  quantity: i64,
  unit_price_cents: i64,
  reason: Option<String>,
  return_status: ReturnStatus,
  order_status: OrderStatus,
  delivery_status: Option<DeliveryStatus>,
  order_date: DateTime<Utc>,
  requested_at: DateTime<Utc>,
  processed_at: Option<DateTime<Utc>>,
}

/// Return requests, newest first; filtered to one user for the customer
/// view, unfiltered for the staff review queue.
pub async fn list_return_requests(pool: &SqlitePool, user_id: Option<Uuid>) -> Result<Vec<ReturnRequestView>> {
  let rows = sqlx::query_as::<_, ReturnListRow>(
    "SELECT rr.id AS return_id, rr.order_item_id, oi.order_id, rr.user_id, \
            oi.product_id, p.name AS product_name, oi.quantity, oi.unit_price_cents, \
            rr.reason, rr.status AS return_status, \
            o.status AS order_status, d.status AS delivery_status, \
            o.created_at AS order_date, rr.requested_at, rr.processed_at \
     FROM return_requests rr \
     JOIN order_items oi ON oi.id = rr.order_item_id \
     JOIN orders o ON o.id = oi.order_id \
     LEFT JOIN deliveries d ON d.order_id = oi.order_id \
     LEFT JOIN products p ON p.id = oi.product_id \
     WHERE (?1 IS NULL OR rr.user_id = ?1) \
     ORDER BY rr.requested_at DESC",
  )
  .bind(user_id)
  .fetch_all(pool)
  .await?;

  let now = Utc::now();
  Ok(
    rows
      .into_iter()
      .map(|row| {
        // Mirrors the gate in `request_item_return`: a refunded order is
        // settled, everything else on the refund path still takes requests.
        let returnable = matches!(
          row.order_status,
          OrderStatus::Delivered | OrderStatus::RefundWaiting | OrderStatus::RefundRejected
        );
        let return_eligible = returnable && within_return_window(row.order_date, now);
        ReturnRequestView {
          return_id: row.return_id,
          order_item_id: row.order_item_id,
          order_id: row.order_id,
          user_id: row.user_id,
          product_id: row.product_id,
          product_name: row
            .product_name
            .unwrap_or_else(|| format!("Product {}", row.product_id)),
          quantity: row.quantity,
          unit_price_cents: row.unit_price_cents,
          reason: row.reason,
          return_status: row.return_status,
          order_status: row.order_status,
          delivery_status: row.delivery_status,
          order_date: row.order_date,
          return_eligible,
          requested_at: row.requested_at,
          processed_at: row.processed_at,
        }
      })
      .collect(),
  )
}
