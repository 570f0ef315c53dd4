// src/web/routes.rs

use actix_web::web;

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  use crate::web::handlers::{checkout_handlers, order_handlers, payment_handlers, return_handlers};

  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/orders")
          .route("/checkout", web::post().to(checkout_handlers::checkout_handler))
          .route("", web::get().to(order_handlers::list_orders_handler))
          .route(
            "/{order_id}/advance",
            web::put().to(order_handlers::advance_status_handler),
          )
          .route("/{order_id}/status", web::put().to(order_handlers::set_status_handler))
          .route("/{order_id}/cancel", web::put().to(order_handlers::cancel_order_handler))
          .route(
            "/{order_id}/refund",
            web::put().to(order_handlers::request_order_refund_handler),
          ),
      )
      .service(
        web::scope("/returns")
          .route("", web::post().to(return_handlers::create_return_handler))
          .route("", web::get().to(return_handlers::list_returns_handler))
          .route(
            "/{return_id}/decision",
            web::put().to(return_handlers::decide_return_handler),
          ),
      )
      .service(web::scope("/payments").route("", web::post().to(payment_handlers::record_payment_handler))),
  );
}
