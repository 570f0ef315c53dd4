// src/services/inventory.rs

//! Inventory ledger operations.
//!
//! `reserve` is a single conditional UPDATE (decrement-if-sufficient), never
//! a read-then-write, so concurrent checkouts for the same product cannot
//! oversell. Both operations accept any executor so they can run inside the
//! caller's transaction.

use crate::errors::{AppError, Result};
use sqlx::Sqlite;
use uuid::Uuid;

/// Atomically decrement available stock, failing without mutation when the
/// product is unknown or the remaining stock is insufficient.
pub async fn reserve<'e, E>(executor: E, product_id: Uuid, quantity: i64) -> Result<()>
where
  E: sqlx::Executor<'e, Database = Sqlite>,
{
  if quantity <= 0 {
    return Err(AppError::Validation(format!(
      "reserve quantity must be positive (got {})",
      quantity
    )));
  }

  let result = sqlx::query(
    "UPDATE products SET stock_quantity = stock_quantity - ?1 \
     WHERE id = ?2 AND stock_quantity >= ?1",
  )
  .bind(quantity)
  .bind(product_id)
  .execute(executor)
  .await?;

  if result.rows_affected() == 0 {
    return Err(AppError::Conflict(format!(
      "insufficient stock for product {}",
      product_id
    )));
  }
  Ok(())
}

/// Increment available stock. Unknown products are logged and skipped; a
/// restock never fails the surrounding transition.
pub async fn restock<'e, E>(executor: E, product_id: Uuid, quantity: i64) -> Result<()>
where
  E: sqlx::Executor<'e, Database = Sqlite>,
{
  let result = sqlx::query("UPDATE products SET stock_quantity = stock_quantity + ? WHERE id = ?")
    .bind(quantity)
    .bind(product_id)
    .execute(executor)
    .await?;

  if result.rows_affected() == 0 {
    tracing::warn!(%product_id, quantity, "Restock target product no longer exists; skipping");
  }
  Ok(())
}

/// Restock every line item of an order in one statement. Used by order
/// cancellation; per-item refunds restock through [`restock`].
pub async fn restock_order_items<'e, E>(executor: E, order_id: Uuid) -> Result<()>
where
  E: sqlx::Executor<'e, Database = Sqlite>,
{
  sqlx::query(
    "UPDATE products SET stock_quantity = stock_quantity + ( \
       SELECT COALESCE(SUM(oi.quantity), 0) FROM order_items oi \
       WHERE oi.product_id = products.id AND oi.order_id = ?1 \
     ) \
     WHERE id IN (SELECT product_id FROM order_items WHERE order_id = ?1)",
  )
  .bind(order_id)
  .execute(executor)
  .await?;
  Ok(())
}
