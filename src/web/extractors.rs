// src/web/extractors.rs

use actix_web::{FromRequest, HttpRequest};
use futures_util::future;
use uuid::Uuid;

use crate::errors::AppError;

/// Acting user identity, supplied by the external authentication layer as
/// the `X-User-ID` header on proxied requests. This subsystem trusts the
/// header; session validation happens upstream.
#[derive(Debug)]
pub struct AuthenticatedUser {
  pub user_id: Uuid,
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = future::Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    if let Some(user_id_header) = req.headers().get("X-User-ID") {
      if let Ok(user_id_str) = user_id_header.to_str() {
        if let Ok(user_id) = Uuid::parse_str(user_id_str) {
          return future::ready(Ok(AuthenticatedUser { user_id }));
        }
      }
    }
    future::ready(Err(AppError::Validation(
      "Missing or invalid X-User-ID header".to_string(),
    )))
  }
}
