// src/models/order.rs

use crate::models::delivery::DeliveryStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Canonical lifecycle status of an order.
///
/// There is exactly one logical lifecycle per order; `deliveries.status` and
/// the human-facing label are projections of this enum (see
/// [`OrderStatus::delivery_status`] and [`OrderStatus::label`]) and are never
/// written independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
  Processing,
  InTransit,
  Delivered,
  Cancelled,
  RefundWaiting,
  Refunded,
  RefundRejected,
}

impl OrderStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Processing => "processing",
      OrderStatus::InTransit => "in_transit",
      OrderStatus::Delivered => "delivered",
      OrderStatus::Cancelled => "cancelled",
      OrderStatus::RefundWaiting => "refund_waiting",
      OrderStatus::Refunded => "refunded",
      OrderStatus::RefundRejected => "refund_rejected",
    }
  }

  /// Single forward step of the staff-driven advancement. Terminal states
  /// (and `delivered`, which only leaves via the refund path) have no next.
  pub fn next(&self) -> Option<OrderStatus> {
    match self {
      OrderStatus::Processing => Some(OrderStatus::InTransit),
      OrderStatus::InTransit => Some(OrderStatus::Delivered),
      _ => None,
    }
  }

  /// Whether the staff "set status directly" override may target or leave
  /// this state. Cancellation and the refund path have their own guarded
  /// operations with side effects; they are not reachable by a plain write.
  pub fn is_directly_settable(&self) -> bool {
    matches!(
      self,
      OrderStatus::Processing | OrderStatus::InTransit | OrderStatus::Delivered
    )
  }

  /// Projection onto the delivery mirror.
  pub fn delivery_status(&self) -> DeliveryStatus {
    match self {
      OrderStatus::Processing => DeliveryStatus::Preparing,
      OrderStatus::InTransit => DeliveryStatus::InTransit,
      OrderStatus::Delivered => DeliveryStatus::Delivered,
      OrderStatus::Cancelled => DeliveryStatus::Cancelled,
      OrderStatus::RefundWaiting => DeliveryStatus::RefundWaiting,
      OrderStatus::Refunded => DeliveryStatus::Refunded,
      OrderStatus::RefundRejected => DeliveryStatus::RefundRejected,
    }
  }

  /// Normalized display label used by order listings.
  pub fn label(&self) -> &'static str {
    match self {
      OrderStatus::Processing => "Processing",
      OrderStatus::InTransit => "In-transit",
      OrderStatus::Delivered => "Delivered",
      OrderStatus::Cancelled => "Cancelled",
      OrderStatus::RefundWaiting => "Refund Waiting",
      OrderStatus::Refunded => "Refunded",
      OrderStatus::RefundRejected => "Refund Rejected",
    }
  }
}

impl std::str::FromStr for OrderStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    // "shipped" is the historical alias for in_transit.
    match s.trim().to_ascii_lowercase().as_str() {
      "processing" => Ok(OrderStatus::Processing),
      "in_transit" | "shipped" => Ok(OrderStatus::InTransit),
      "delivered" => Ok(OrderStatus::Delivered),
      "cancelled" => Ok(OrderStatus::Cancelled),
      "refund_waiting" => Ok(OrderStatus::RefundWaiting),
      "refunded" => Ok(OrderStatus::Refunded),
      "refund_rejected" => Ok(OrderStatus::RefundRejected),
      other => Err(format!("unknown order status '{}'", other)),
    }
  }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Order {
  pub id: Uuid,
  pub user_id: Uuid,
  pub created_at: DateTime<Utc>,
  pub status: OrderStatus,
  /// Fixed at checkout; never recomputed from current catalog prices.
  pub total_amount_cents: i64,
  pub shipping_address: Option<String>,
  pub billing_address: Option<String>,
}
