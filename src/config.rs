// src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,

  /// 32-byte AES-256-GCM key for sealing card data, hex (64 chars) or
  /// base64 encoded. When absent, card fields are dropped before persistence
  /// instead of being stored in plaintext.
  pub payment_encryption_key: Option<[u8; 32]>,

  /// Sender identity stamped on outbound order notifications.
  pub notification_sender: String,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let database_url = get_env("DATABASE_URL").unwrap_or_else(|_| "sqlite://suhome_orders.db".to_string());

    let payment_encryption_key = match env::var("PAYMENT_ENCRYPTION_KEY") {
      Ok(raw) => Some(parse_payment_key(&raw)?),
      Err(_) => {
        tracing::warn!("PAYMENT_ENCRYPTION_KEY is not configured; card data will not be persisted.");
        None
      }
    };

    let notification_sender = get_env("NOTIFICATION_SENDER").unwrap_or_else(|_| "noreply@suhome.example".to_string());

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      database_url,
      payment_encryption_key,
      notification_sender,
    })
  }
}

/// Accepts the key as 64 hex chars or as base64; it must decode to exactly
/// 32 bytes.
fn parse_payment_key(raw: &str) -> Result<[u8; 32]> {
  use base64::Engine as _;

  let bytes = if raw.len() == 64 && raw.chars().all(|c| c.is_ascii_hexdigit()) {
    hex::decode(raw).map_err(|e| AppError::Config(format!("Invalid hex PAYMENT_ENCRYPTION_KEY: {}", e)))?
  } else {
    base64::engine::general_purpose::STANDARD
      .decode(raw)
      .map_err(|e| AppError::Config(format!("Invalid base64 PAYMENT_ENCRYPTION_KEY: {}", e)))?
  };

  <[u8; 32]>::try_from(bytes.as_slice())
    .map_err(|_| AppError::Config("PAYMENT_ENCRYPTION_KEY must be 32 bytes".to_string()))
}
