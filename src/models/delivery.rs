// src/models/delivery.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Shipment-tracking mirror of [`crate::models::OrderStatus`]. Written only
/// in the same transaction as the order status it reflects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
  Preparing,
  InTransit,
  Delivered,
  Cancelled,
  RefundWaiting,
  Refunded,
  RefundRejected,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Delivery {
  pub id: Uuid,
  pub order_id: Uuid,
  pub user_id: Uuid,
  pub status: DeliveryStatus,
  pub carrier: Option<String>,
  pub updated_at: DateTime<Utc>,
}
