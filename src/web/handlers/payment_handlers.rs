// src/web/handlers/payment_handlers.rs

use actix_web::{web, HttpResponse};
use tracing::instrument;

use crate::errors::AppError;
use crate::services::payments::{self, RecordPayment};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[instrument(
  name = "handler::record_payment",
  skip(app_state, payload, auth_user),
  fields(user_id = %auth_user.user_id, order_id = %payload.order_id)
)]
pub async fn record_payment_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  payload: web::Json<RecordPayment>,
) -> Result<HttpResponse, AppError> {
  let outcome = payments::record_payment(
    &app_state.db_pool,
    app_state.card_cipher.as_deref(),
    auth_user.user_id,
    payload.into_inner(),
  )
  .await?;
  Ok(HttpResponse::Created().json(outcome))
}
