// src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::OrderStatus;
use crate::services::notifications::{self, OrderEvent, OrderEventKind};
use crate::services::orders;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
  pub user_id: Option<Uuid>,
}

#[instrument(name = "handler::list_orders", skip(app_state, query))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  query: web::Query<ListOrdersQuery>,
) -> Result<HttpResponse, AppError> {
  let views = orders::list_orders(&app_state.db_pool, query.user_id).await?;
  Ok(HttpResponse::Ok().json(views))
}

#[instrument(name = "handler::advance_status", skip(app_state), fields(order_id = %path))]
pub async fn advance_status_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let outcome = orders::advance_status(&app_state.db_pool, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(outcome))
}

#[derive(Debug, Deserialize)]
pub struct SetStatusPayload {
  pub status: String,
}

#[instrument(name = "handler::set_status", skip(app_state, payload), fields(order_id = %path))]
pub async fn set_status_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: web::Json<SetStatusPayload>,
) -> Result<HttpResponse, AppError> {
  let target: OrderStatus = payload
    .status
    .parse()
    .map_err(AppError::Validation)?;
  let outcome = orders::set_status(&app_state.db_pool, path.into_inner(), target).await?;
  Ok(HttpResponse::Ok().json(outcome))
}

#[instrument(name = "handler::cancel_order", skip(app_state), fields(order_id = %path))]
pub async fn cancel_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let outcome = orders::cancel_order(&app_state.db_pool, path.into_inner()).await?;

  notifications::dispatch(
    &app_state,
    OrderEvent {
      kind: OrderEventKind::OrderCancelled,
      order_id: outcome.order_id,
      user_id: outcome.user_id,
      amount_cents: outcome.total_amount_cents,
    },
  );

  Ok(HttpResponse::Ok().json(outcome))
}

#[instrument(name = "handler::request_order_refund", skip(app_state), fields(order_id = %path))]
pub async fn request_order_refund_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let outcome = orders::request_order_refund(&app_state.db_pool, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(outcome))
}
