// src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::instrument;

use crate::errors::AppError;
use crate::services::checkout::{self, CheckoutLine};
use crate::services::notifications::{self, OrderEvent, OrderEventKind};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Debug, Deserialize)]
pub struct CheckoutRequestPayload {
  /// Explicit line items; when omitted the user's stored cart is used.
  #[serde(default)]
  pub items: Vec<CheckoutLine>,
  pub shipping_address: Option<serde_json::Value>,
  pub billing_address: Option<serde_json::Value>,
  #[serde(default)]
  pub shipping_fee_cents: i64,
}

#[instrument(
  name = "handler::checkout",
  skip(app_state, payload, auth_user),
  fields(user_id = %auth_user.user_id)
)]
pub async fn checkout_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  payload: web::Json<CheckoutRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();

  let outcome = checkout::checkout(
    &app_state.db_pool,
    auth_user.user_id,
    payload.items,
    payload.shipping_address.as_ref(),
    payload.billing_address.as_ref(),
    payload.shipping_fee_cents,
  )
  .await?;

  // Invoice + email rendering happens behind the notification boundary;
  // the order is committed regardless of what happens over there.
  notifications::dispatch(
    &app_state,
    OrderEvent {
      kind: OrderEventKind::CheckoutCompleted,
      order_id: outcome.order_id,
      user_id: auth_user.user_id,
      amount_cents: outcome.total_amount_cents,
    },
  );

  Ok(HttpResponse::Created().json(outcome))
}
