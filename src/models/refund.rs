// src/models/refund.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Ledger entry documenting money returned against a payment. The unique
/// index on `return_id` guarantees at most one refund per return request.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Refund {
  pub id: Uuid,
  pub payment_id: Uuid,
  pub return_id: Uuid,
  pub amount_cents: i64,
  pub status: String,
  pub processed_at: DateTime<Utc>,
}
