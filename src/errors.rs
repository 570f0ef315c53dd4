// src/errors.rs

use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Application error taxonomy.
///
/// Callers distinguish retryable rejections from business-rule violations by
/// the error kind, never by message matching: a `Conflict` caused by a lost
/// race (stock decrement, concurrent status write) is safe to retry, while a
/// `Conflict` caused by a disallowed transition is not — the payload carries
/// the reason either way.
#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Conflict: {0}")]
  Conflict(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  /// A best-effort outbound dependency (mail, invoice rendering) failed.
  /// Never returned by the core mutating operations; they commit first and
  /// dispatch side effects asynchronously.
  #[error("Dependency Error: {0}")]
  Dependency(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Card sealing error: {0}")]
  Crypto(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

// Allow anyhow::Error to be converted into AppError::Internal for convenience
// in handlers that call helpers returning anyhow::Result.
impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<sqlx::Error>() {
      Ok(sqlx_err) => AppError::Sqlx(sqlx_err),
      Err(other) => AppError::Internal(other.to_string()),
    }
  }
}

impl ResponseError for AppError {
  fn error_response(&self) -> HttpResponse {
    // Log the full error when it's turned into a response.
    tracing::error!(application_error = %self, "Responding with error");
    match self {
      AppError::Validation(m) => HttpResponse::BadRequest().json(json!({"error": m})),
      AppError::Conflict(m) => HttpResponse::Conflict().json(json!({"error": m})),
      AppError::NotFound(m) => HttpResponse::NotFound().json(json!({"error": m})),
      AppError::Dependency(m) => HttpResponse::BadGateway().json(json!({"error": "Upstream dependency failed", "detail": m})),
      AppError::Config(m) => {
        HttpResponse::InternalServerError().json(json!({"error": "Configuration issue", "detail": m}))
      }
      AppError::Crypto(_) => {
        HttpResponse::InternalServerError().json(json!({"error": "Card data could not be processed"}))
      }
      AppError::Sqlx(_) => HttpResponse::InternalServerError().json(json!({"error": "Database operation failed"})),
      AppError::Internal(m) => {
        HttpResponse::InternalServerError().json(json!({"error": "An internal error occurred", "detail": m}))
      }
    }
  }
}

// Define a Result type alias for the application.
pub type Result<T, E = AppError> = std::result::Result<T, E>;
