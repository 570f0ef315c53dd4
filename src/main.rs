// src/main.rs

use std::sync::Arc;

use actix_web::{web as actix_data, App, HttpServer};
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

use suhome_orders::config::AppConfig;
use suhome_orders::services::card_vault::CardCipher;
use suhome_orders::services::notifications::LogNotifier;
use suhome_orders::state::AppState;
use suhome_orders::{db, web};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  dotenvy::dotenv().ok();

  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting order lifecycle server...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      panic!("Configuration error: {}", e);
    }
  };

  let db_pool = match db::connect(&app_config.database_url).await {
    Ok(pool) => {
      tracing::info!("Successfully connected to the database.");
      pool
    }
    Err(e) => {
      tracing::error!(error = %e, "Failed to connect to the database.");
      panic!("Database connection error: {}", e);
    }
  };

  if let Err(e) = db::init_schema(&db_pool).await {
    tracing::error!(error = %e, "Failed to initialize database schema.");
    panic!("Schema initialization error: {}", e);
  }

  let card_cipher = match app_config.payment_encryption_key.as_ref() {
    Some(key) => match CardCipher::new(key) {
      Ok(cipher) => Some(Arc::new(cipher)),
      Err(e) => {
        tracing::error!(error = %e, "Failed to initialize the card cipher.");
        panic!("Card cipher error: {}", e);
      }
    },
    None => None,
  };

  let app_state = AppState {
    db_pool: db_pool.clone(),
    config: app_config.clone(),
    notifier: Arc::new(LogNotifier {
      sender: app_config.notification_sender.clone(),
    }),
    card_cipher,
  };

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::routes::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
