// src/services/notifications.rs

//! Outbound notification boundary.
//!
//! The invoice/email subsystem is an external collaborator; this module
//! only defines the event contract and a fire-and-forget dispatcher. A
//! failed dispatch is logged as a dependency error and never reaches the
//! caller of the core mutation — by the time an event exists, the state
//! change that produced it has already committed.

use crate::errors::{AppError, Result};
use crate::state::AppState;
use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderEventKind {
  CheckoutCompleted,
  OrderCancelled,
  OrderRefunded,
}

impl OrderEventKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      OrderEventKind::CheckoutCompleted => "checkout_completed",
      OrderEventKind::OrderCancelled => "order_cancelled",
      OrderEventKind::OrderRefunded => "order_refunded",
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderEvent {
  pub kind: OrderEventKind,
  pub order_id: Uuid,
  pub user_id: Uuid,
  pub amount_cents: i64,
}

#[async_trait]
pub trait Notifier: Send + Sync {
  async fn notify(&self, event: &OrderEvent) -> Result<()>;
}

/// Default notifier: logs what the external mailer/invoice renderer would
/// receive. Stands in for the SMTP + PDF pipeline that lives outside this
/// subsystem.
pub struct LogNotifier {
  pub sender: String,
}

#[async_trait]
impl Notifier for LogNotifier {
  async fn notify(&self, event: &OrderEvent) -> Result<()> {
    tracing::info!(
      kind = event.kind.as_str(),
      order_id = %event.order_id,
      user_id = %event.user_id,
      amount_cents = event.amount_cents,
      sender = %self.sender,
      "Dispatching order notification"
    );
    Ok(())
  }
}

/// Notifier that always fails; used in tests to show dispatch failures
/// stay contained.
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
  async fn notify(&self, event: &OrderEvent) -> Result<()> {
    Err(AppError::Dependency(format!(
      "notification endpoint unavailable for order {}",
      event.order_id
    )))
  }
}

/// Fire-and-forget dispatch. Spawned so the HTTP response never waits on
/// the notification path.
pub fn dispatch(state: &AppState, event: OrderEvent) {
  let notifier = state.notifier.clone();
  tokio::spawn(async move {
    if let Err(err) = notifier.notify(&event).await {
      tracing::warn!(
        kind = event.kind.as_str(),
        order_id = %event.order_id,
        error = %err,
        "Order notification dispatch failed"
      );
    }
  });
}
