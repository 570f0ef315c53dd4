// src/services/payments.rs

//! Payment ledger: append-only records, deduplicated per order by the
//! client-supplied transaction reference so a retried request returns the
//! original record instead of inserting a second charge.

use crate::errors::{AppError, Result};
use crate::models::CardDetails;
use crate::services::card_vault::CardCipher;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct RecordPayment {
  pub order_id: Uuid,
  pub amount_cents: i64,
  pub method: String,
  #[serde(default)]
  pub status: Option<String>,
  #[serde(default)]
  pub paid_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub transaction_ref: Option<String>,
  #[serde(default)]
  pub card: Option<CardDetails>,
}

#[derive(Debug, Serialize)]
pub struct PaymentOutcome {
  pub payment_id: Uuid,
  /// True when an existing record was returned instead of a new insert.
  pub deduplicated: bool,
}

pub async fn record_payment(
  pool: &SqlitePool,
  cipher: Option<&CardCipher>,
  user_id: Uuid,
  req: RecordPayment,
) -> Result<PaymentOutcome> {
  let method = req.method.trim().to_ascii_lowercase();
  if method.is_empty() {
    return Err(AppError::Validation("payment method is required".to_string()));
  }
  if req.amount_cents < 0 {
    return Err(AppError::Validation("payment amount must not be negative".to_string()));
  }
  let status = req
    .status
    .map(|s| s.trim().to_ascii_lowercase())
    .filter(|s| !s.is_empty())
    .unwrap_or_else(|| "initiated".to_string());
  let transaction_ref = req.transaction_ref.filter(|r| !r.trim().is_empty());

  // The order must exist before money is recorded against it.
  let order_exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE id = ?")
    .bind(req.order_id)
    .fetch_one(pool)
    .await?;
  if order_exists == 0 {
    return Err(AppError::NotFound(format!("order {} not found", req.order_id)));
  }

  if let Some(existing) = find_by_ref(pool, req.order_id, transaction_ref.as_deref()).await? {
    return Ok(PaymentOutcome {
      payment_id: existing,
      deduplicated: true,
    });
  }

  let sealed = seal_card_fields(cipher, req.card.as_ref())?;

  let payment_id = Uuid::new_v4();
  let inserted = sqlx::query(
    "INSERT INTO payments (id, order_id, user_id, amount_cents, method, status, paid_at, \
                           transaction_ref, card_holder_enc, card_number_enc, card_expiry_enc, \
                           card_last4, created_at) \
     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
  )
  .bind(payment_id)
  .bind(req.order_id)
  .bind(user_id)
  .bind(req.amount_cents)
  .bind(&method)
  .bind(&status)
  .bind(req.paid_at)
  .bind(&transaction_ref)
  .bind(&sealed.holder)
  .bind(&sealed.number)
  .bind(&sealed.expiry)
  .bind(&sealed.last4)
  .bind(Utc::now())
  .execute(pool)
  .await;

  match inserted {
    Ok(_) => {
      tracing::info!(%payment_id, order_id = %req.order_id, "Payment recorded");
      Ok(PaymentOutcome {
        payment_id,
        deduplicated: false,
      })
    }
    Err(err) => {
      // Lost a dedupe race: the unique (order_id, transaction_ref) index
      // fired, so the concurrent insert is the record to return.
      let unique = err
        .as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false);
      if unique {
        if let Some(existing) = find_by_ref(pool, req.order_id, transaction_ref.as_deref()).await? {
          return Ok(PaymentOutcome {
            payment_id: existing,
            deduplicated: true,
          });
        }
      }
      Err(err.into())
    }
  }
}

async fn find_by_ref(pool: &SqlitePool, order_id: Uuid, transaction_ref: Option<&str>) -> Result<Option<Uuid>> {
  let Some(txn_ref) = transaction_ref else {
    return Ok(None);
  };
  let existing = sqlx::query_scalar::<_, Uuid>(
    "SELECT id FROM payments WHERE order_id = ? AND transaction_ref = ? LIMIT 1",
  )
  .bind(order_id)
  .bind(txn_ref)
  .fetch_optional(pool)
  .await?;
  Ok(existing)
}

#[derive(Default)]
struct SealedCard {
  holder: Option<String>,
  number: Option<String>,
  expiry: Option<String>,
  last4: Option<String>,
}

/// Seal whatever card fields were submitted. Without a configured cipher
/// the sealed fields are dropped (never stored in plaintext); the last-4
/// fragment is kept either way since it is extracted pre-seal for display.
fn seal_card_fields(cipher: Option<&CardCipher>, card: Option<&CardDetails>) -> Result<SealedCard> {
  let Some(card) = card else {
    return Ok(SealedCard::default());
  };

  let digits: Option<String> = card
    .number
    .as_deref()
    .map(|n| n.chars().filter(|c| c.is_ascii_digit()).collect::<String>())
    .filter(|d| !d.is_empty());
  let last4 = digits
    .as_deref()
    .map(|d| d.chars().rev().take(4).collect::<Vec<_>>().iter().rev().collect::<String>());

  let Some(cipher) = cipher else {
    tracing::warn!("No payment encryption key configured; dropping card fields from payment record");
    return Ok(SealedCard {
      last4,
      ..SealedCard::default()
    });
  };

  let seal_opt = |value: Option<&str>| -> Result<Option<String>> {
    value.filter(|v| !v.trim().is_empty()).map(|v| cipher.seal(v)).transpose()
  };

  Ok(SealedCard {
    holder: seal_opt(card.holder_name.as_deref())?,
    number: seal_opt(digits.as_deref())?,
    expiry: seal_opt(card.expiry.as_deref())?,
    last4,
  })
}
