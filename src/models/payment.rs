// src/models/payment.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Append-only payment record. `transaction_ref` deduplicates retried client
/// requests per order; card data is persisted only as sealed blobs plus the
/// displayable last-4 fragment.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Payment {
  pub id: Uuid,
  pub order_id: Uuid,
  pub user_id: Uuid,
  pub amount_cents: i64,
  pub method: String,
  pub status: String,
  pub paid_at: Option<DateTime<Utc>>,
  pub transaction_ref: Option<String>,
  #[serde(skip_serializing)]
  pub card_holder_enc: Option<String>,
  #[serde(skip_serializing)]
  pub card_number_enc: Option<String>,
  #[serde(skip_serializing)]
  pub card_expiry_enc: Option<String>,
  pub card_last4: Option<String>,
  pub created_at: DateTime<Utc>,
}

/// Raw card data as submitted by the client. Never stored in this form.
#[derive(Debug, Clone, Deserialize)]
pub struct CardDetails {
  pub holder_name: Option<String>,
  pub number: Option<String>,
  pub expiry: Option<String>,
}
