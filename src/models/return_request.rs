// src/models/return_request.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Status of a per-line-item return request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReturnStatus {
  Requested,
  Accepted,
  Rejected,
  Received,
  Refunded,
}

impl ReturnStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      ReturnStatus::Requested => "requested",
      ReturnStatus::Accepted => "accepted",
      ReturnStatus::Rejected => "rejected",
      ReturnStatus::Received => "received",
      ReturnStatus::Refunded => "refunded",
    }
  }

  /// A request counts as active while it has not been rejected; an active
  /// request blocks a second request on the same line item, a rejected one
  /// does not.
  pub fn is_active(&self) -> bool {
    !matches!(self, ReturnStatus::Rejected)
  }

  /// Staff decision transition table. `rejected` and `refunded` are
  /// reachable from any undecided state; everything else is single-step.
  pub fn can_become(&self, next: ReturnStatus) -> bool {
    let pending = matches!(
      self,
      ReturnStatus::Requested | ReturnStatus::Accepted | ReturnStatus::Received
    );
    match next {
      ReturnStatus::Accepted => *self == ReturnStatus::Requested,
      ReturnStatus::Received => *self == ReturnStatus::Accepted,
      ReturnStatus::Rejected | ReturnStatus::Refunded => pending,
      ReturnStatus::Requested => false,
    }
  }
}

impl std::str::FromStr for ReturnStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "requested" => Ok(ReturnStatus::Requested),
      "accepted" => Ok(ReturnStatus::Accepted),
      "rejected" => Ok(ReturnStatus::Rejected),
      "received" => Ok(ReturnStatus::Received),
      "refunded" => Ok(ReturnStatus::Refunded),
      other => Err(format!("unknown return status '{}'", other)),
    }
  }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReturnRequest {
  pub id: Uuid,
  pub order_item_id: Uuid,
  pub user_id: Uuid,
  pub reason: Option<String>,
  pub status: ReturnStatus,
  pub requested_at: DateTime<Utc>,
  /// Set on the first transition out of `requested`.
  pub processed_at: Option<DateTime<Utc>>,
}
