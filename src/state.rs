// src/state.rs

use crate::config::AppConfig;
use crate::services::card_vault::CardCipher;
use crate::services::notifications::Notifier;
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub db_pool: SqlitePool,
  pub config: Arc<AppConfig>,
  pub notifier: Arc<dyn Notifier>,
  /// Present only when a payment encryption key is configured.
  pub card_cipher: Option<Arc<CardCipher>>,
}
