// src/web/handlers/return_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::ReturnStatus;
use crate::services::notifications::{self, OrderEvent, OrderEventKind};
use crate::services::returns;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Debug, Deserialize)]
pub struct CreateReturnPayload {
  pub order_item_id: Uuid,
  pub reason: Option<String>,
}

#[instrument(
  name = "handler::create_return",
  skip(app_state, payload, auth_user),
  fields(user_id = %auth_user.user_id, order_item_id = %payload.order_item_id)
)]
pub async fn create_return_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  payload: web::Json<CreateReturnPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let outcome = returns::request_item_return(
    &app_state.db_pool,
    auth_user.user_id,
    payload.order_item_id,
    payload.reason,
  )
  .await?;
  Ok(HttpResponse::Created().json(outcome))
}

#[derive(Debug, Deserialize)]
pub struct ListReturnsQuery {
  pub user_id: Option<Uuid>,
}

#[instrument(name = "handler::list_returns", skip(app_state, query))]
pub async fn list_returns_handler(
  app_state: web::Data<AppState>,
  query: web::Query<ListReturnsQuery>,
) -> Result<HttpResponse, AppError> {
  let views = returns::list_return_requests(&app_state.db_pool, query.user_id).await?;
  Ok(HttpResponse::Ok().json(views))
}

#[derive(Debug, Deserialize)]
pub struct DecideReturnPayload {
  pub status: String,
}

#[instrument(name = "handler::decide_return", skip(app_state, payload), fields(return_id = %path))]
pub async fn decide_return_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: web::Json<DecideReturnPayload>,
) -> Result<HttpResponse, AppError> {
  let decision: ReturnStatus = payload
    .status
    .parse()
    .map_err(AppError::Validation)?;

  let outcome = returns::decide_return(&app_state.db_pool, path.into_inner(), decision).await?;

  if let Some(refund) = &outcome.refund {
    notifications::dispatch(
      &app_state,
      OrderEvent {
        kind: OrderEventKind::OrderRefunded,
        order_id: outcome.order_id,
        user_id: outcome.user_id,
        amount_cents: refund.amount_cents,
      },
    );
  }

  Ok(HttpResponse::Ok().json(outcome))
}
