// tests/lifecycle.rs
//
// End-to-end exercises of the order lifecycle against an in-memory
// database: checkout, status advancement, cancellation, returns and
// refunds, and the payment ledger.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use sqlx::SqlitePool;
use uuid::Uuid;

use suhome_orders::config::AppConfig;
use suhome_orders::db;
use suhome_orders::errors::AppError;
use suhome_orders::models::{DeliveryStatus, OrderStatus, ReturnStatus};
use suhome_orders::services::checkout::{self, CheckoutLine};
use suhome_orders::services::notifications::{self, FailingNotifier, OrderEvent, OrderEventKind};
use suhome_orders::services::orders;
use suhome_orders::services::payments::{self, RecordPayment};
use suhome_orders::services::returns;
use suhome_orders::state::AppState;

async fn test_pool() -> SqlitePool {
  let pool = db::connect_in_memory().await.expect("pool");
  db::init_schema(&pool).await.expect("schema");
  pool
}

async fn seed_product(pool: &SqlitePool, name: &str, price_cents: i64, stock: i64) -> Uuid {
  let id = Uuid::new_v4();
  sqlx::query("INSERT INTO products (id, name, price_cents, stock_quantity, created_at) VALUES (?, ?, ?, ?, ?)")
    .bind(id)
    .bind(name)
    .bind(price_cents)
    .bind(stock)
    .bind(Utc::now())
    .execute(pool)
    .await
    .expect("seed product");
  id
}

async fn stock_of(pool: &SqlitePool, product_id: Uuid) -> i64 {
  sqlx::query_scalar("SELECT stock_quantity FROM products WHERE id = ?")
    .bind(product_id)
    .fetch_one(pool)
    .await
    .expect("stock")
}

async fn order_status_of(pool: &SqlitePool, order_id: Uuid) -> OrderStatus {
  sqlx::query_scalar("SELECT status FROM orders WHERE id = ?")
    .bind(order_id)
    .fetch_one(pool)
    .await
    .expect("order status")
}

async fn delivery_status_of(pool: &SqlitePool, order_id: Uuid) -> DeliveryStatus {
  sqlx::query_scalar("SELECT status FROM deliveries WHERE order_id = ?")
    .bind(order_id)
    .fetch_one(pool)
    .await
    .expect("delivery status")
}

fn line(product_id: Uuid, quantity: i64, unit_price_cents: i64) -> CheckoutLine {
  CheckoutLine {
    product_id,
    quantity,
    unit_price_cents,
  }
}

fn shipping() -> serde_json::Value {
  json!({"name": "A. Customer", "street": "1 Test Street", "city": "Istanbul"})
}

async fn checkout_delivered_order(pool: &SqlitePool, user_id: Uuid, product_id: Uuid) -> Uuid {
  let outcome = checkout::checkout(pool, user_id, vec![line(product_id, 2, 10_000)], Some(&shipping()), None, 0)
    .await
    .expect("checkout");
  orders::advance_status(pool, outcome.order_id).await.expect("in transit");
  orders::advance_status(pool, outcome.order_id).await.expect("delivered");
  outcome.order_id
}

async fn record_card_payment(pool: &SqlitePool, user_id: Uuid, order_id: Uuid, amount_cents: i64) -> Uuid {
  let outcome = payments::record_payment(
    pool,
    None,
    user_id,
    RecordPayment {
      order_id,
      amount_cents,
      method: "card".to_string(),
      status: Some("paid".to_string()),
      paid_at: Some(Utc::now()),
      transaction_ref: Some(format!("txn-{}", order_id)),
      card: None,
    },
  )
  .await
  .expect("payment");
  outcome.payment_id
}

#[actix_rt::test]
async fn checkout_computes_total_and_reserves_stock() {
  let pool = test_pool().await;
  let user_id = Uuid::new_v4();
  let lamp = seed_product(&pool, "Desk Lamp", 10_000, 10).await;
  let mug = seed_product(&pool, "Mug", 5_000, 5).await;

  let outcome = checkout::checkout(
    &pool,
    user_id,
    vec![line(lamp, 2, 10_000), line(mug, 1, 5_000)],
    Some(&shipping()),
    Some(&json!("Billing Dept, 2 Invoice Way")),
    2_000,
  )
  .await
  .expect("checkout");

  assert_eq!(outcome.total_amount_cents, 27_000);
  assert_eq!(outcome.order_status, OrderStatus::Processing);
  assert_eq!(outcome.delivery_status, DeliveryStatus::Preparing);
  assert_eq!(stock_of(&pool, lamp).await, 8);
  assert_eq!(stock_of(&pool, mug).await, 4);
  assert_eq!(delivery_status_of(&pool, outcome.order_id).await, DeliveryStatus::Preparing);

  let invoice_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoices WHERE order_id = ?")
    .bind(outcome.order_id)
    .fetch_one(&pool)
    .await
    .unwrap();
  assert_eq!(invoice_count, 1);
}

#[actix_rt::test]
async fn insufficient_stock_rolls_back_the_whole_checkout() {
  let pool = test_pool().await;
  let user_id = Uuid::new_v4();
  let lamp = seed_product(&pool, "Desk Lamp", 10_000, 10).await;
  let mug = seed_product(&pool, "Mug", 5_000, 1).await;

  let err = checkout::checkout(
    &pool,
    user_id,
    vec![line(lamp, 2, 10_000), line(mug, 3, 5_000)],
    Some(&shipping()),
    None,
    0,
  )
  .await
  .expect_err("oversell must fail");
  assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);

  // Nothing from the attempt survives, including the first line's reserve.
  assert_eq!(stock_of(&pool, lamp).await, 10);
  assert_eq!(stock_of(&pool, mug).await, 1);
  let order_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders").fetch_one(&pool).await.unwrap();
  assert_eq!(order_count, 0);
}

#[actix_rt::test]
async fn checkout_falls_back_to_the_stored_cart_and_clears_it() {
  let pool = test_pool().await;
  let user_id = Uuid::new_v4();
  let lamp = seed_product(&pool, "Desk Lamp", 10_000, 10).await;

  sqlx::query("INSERT INTO cart_items (id, user_id, product_id, quantity, added_at) VALUES (?, ?, ?, ?, ?)")
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(lamp)
    .bind(3_i64)
    .bind(Utc::now())
    .execute(&pool)
    .await
    .unwrap();

  let outcome = checkout::checkout(&pool, user_id, Vec::new(), Some(&shipping()), None, 0)
    .await
    .expect("checkout from cart");

  assert_eq!(outcome.total_amount_cents, 30_000);
  assert_eq!(stock_of(&pool, lamp).await, 7);
  let cart_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cart_items WHERE user_id = ?")
    .bind(user_id)
    .fetch_one(&pool)
    .await
    .unwrap();
  assert_eq!(cart_count, 0);
}

#[actix_rt::test]
async fn empty_cart_is_a_validation_error() {
  let pool = test_pool().await;
  let err = checkout::checkout(&pool, Uuid::new_v4(), Vec::new(), Some(&shipping()), None, 0)
    .await
    .expect_err("empty cart");
  assert!(matches!(err, AppError::Validation(_)), "got {:?}", err);
}

#[actix_rt::test]
async fn missing_shipping_address_is_rejected() {
  let pool = test_pool().await;
  let lamp = seed_product(&pool, "Desk Lamp", 10_000, 10).await;
  let err = checkout::checkout(&pool, Uuid::new_v4(), vec![line(lamp, 1, 10_000)], None, None, 0)
    .await
    .expect_err("no shipping address");
  assert!(matches!(err, AppError::Validation(_)), "got {:?}", err);
}

#[actix_rt::test]
async fn advance_walks_the_fulfilment_chain_and_stops_at_delivered() {
  let pool = test_pool().await;
  let user_id = Uuid::new_v4();
  let lamp = seed_product(&pool, "Desk Lamp", 10_000, 10).await;
  let outcome = checkout::checkout(&pool, user_id, vec![line(lamp, 1, 10_000)], Some(&shipping()), None, 0)
    .await
    .expect("checkout");

  let step = orders::advance_status(&pool, outcome.order_id).await.expect("advance");
  assert_eq!(step.status, OrderStatus::InTransit);
  assert_eq!(delivery_status_of(&pool, outcome.order_id).await, DeliveryStatus::InTransit);

  let step = orders::advance_status(&pool, outcome.order_id).await.expect("advance");
  assert_eq!(step.status, OrderStatus::Delivered);
  assert_eq!(delivery_status_of(&pool, outcome.order_id).await, DeliveryStatus::Delivered);

  let err = orders::advance_status(&pool, outcome.order_id).await.expect_err("terminal");
  assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);
}

#[actix_rt::test]
async fn cancel_and_refund_states_cannot_be_set_directly() {
  let pool = test_pool().await;
  let user_id = Uuid::new_v4();
  let lamp = seed_product(&pool, "Desk Lamp", 10_000, 10).await;
  let outcome = checkout::checkout(&pool, user_id, vec![line(lamp, 1, 10_000)], Some(&shipping()), None, 0)
    .await
    .expect("checkout");

  for target in [OrderStatus::Cancelled, OrderStatus::Refunded, OrderStatus::RefundWaiting] {
    let err = orders::set_status(&pool, outcome.order_id, target).await.expect_err("guarded");
    assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);
  }

  // The three fulfilment states remain settable, including skipping ahead.
  let set = orders::set_status(&pool, outcome.order_id, OrderStatus::Delivered).await.expect("set");
  assert_eq!(set.status, OrderStatus::Delivered);
  assert_eq!(delivery_status_of(&pool, outcome.order_id).await, DeliveryStatus::Delivered);
}

#[actix_rt::test]
async fn cancel_restocks_exactly_once() {
  let pool = test_pool().await;
  let user_id = Uuid::new_v4();
  let lamp = seed_product(&pool, "Desk Lamp", 10_000, 10).await;
  let outcome = checkout::checkout(&pool, user_id, vec![line(lamp, 4, 10_000)], Some(&shipping()), None, 0)
    .await
    .expect("checkout");
  assert_eq!(stock_of(&pool, lamp).await, 6);

  let cancelled = orders::cancel_order(&pool, outcome.order_id).await.expect("cancel");
  assert_eq!(cancelled.status, OrderStatus::Cancelled);
  assert_eq!(stock_of(&pool, lamp).await, 10);
  assert_eq!(delivery_status_of(&pool, outcome.order_id).await, DeliveryStatus::Cancelled);

  let err = orders::cancel_order(&pool, outcome.order_id).await.expect_err("second cancel");
  assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);
  assert_eq!(stock_of(&pool, lamp).await, 10);
}

#[actix_rt::test]
async fn shipped_orders_cannot_be_cancelled() {
  let pool = test_pool().await;
  let user_id = Uuid::new_v4();
  let lamp = seed_product(&pool, "Desk Lamp", 10_000, 10).await;
  let outcome = checkout::checkout(&pool, user_id, vec![line(lamp, 1, 10_000)], Some(&shipping()), None, 0)
    .await
    .expect("checkout");
  orders::advance_status(&pool, outcome.order_id).await.expect("in transit");

  let err = orders::cancel_order(&pool, outcome.order_id).await.expect_err("in transit");
  assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);
  assert_eq!(stock_of(&pool, lamp).await, 9);
}

#[actix_rt::test]
async fn order_refund_opens_a_return_per_line_item() {
  let pool = test_pool().await;
  let user_id = Uuid::new_v4();
  let lamp = seed_product(&pool, "Desk Lamp", 10_000, 10).await;
  let mug = seed_product(&pool, "Mug", 5_000, 5).await;
  let outcome = checkout::checkout(
    &pool,
    user_id,
    vec![line(lamp, 1, 10_000), line(mug, 2, 5_000)],
    Some(&shipping()),
    None,
    0,
  )
  .await
  .expect("checkout");
  orders::advance_status(&pool, outcome.order_id).await.expect("in transit");
  orders::advance_status(&pool, outcome.order_id).await.expect("delivered");

  let refund = orders::request_order_refund(&pool, outcome.order_id).await.expect("refund request");
  assert_eq!(refund.opened_returns, 2);
  assert_eq!(refund.status, OrderStatus::RefundWaiting);
  assert_eq!(order_status_of(&pool, outcome.order_id).await, OrderStatus::RefundWaiting);
  assert_eq!(delivery_status_of(&pool, outcome.order_id).await, DeliveryStatus::RefundWaiting);

  let err = orders::request_order_refund(&pool, outcome.order_id).await.expect_err("repeat");
  assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);
}

#[actix_rt::test]
async fn refunds_are_refused_outside_the_window() {
  let pool = test_pool().await;
  let user_id = Uuid::new_v4();
  let lamp = seed_product(&pool, "Desk Lamp", 10_000, 10).await;
  let order_id = checkout_delivered_order(&pool, user_id, lamp).await;

  sqlx::query("UPDATE orders SET created_at = ? WHERE id = ?")
    .bind(Utc::now() - Duration::days(31))
    .bind(order_id)
    .execute(&pool)
    .await
    .unwrap();

  let err = orders::request_order_refund(&pool, order_id).await.expect_err("window expired");
  assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);

  let item_id: Uuid = sqlx::query_scalar("SELECT id FROM order_items WHERE order_id = ?")
    .bind(order_id)
    .fetch_one(&pool)
    .await
    .unwrap();
  let err = returns::request_item_return(&pool, user_id, item_id, None).await.expect_err("window expired");
  assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);
}

#[actix_rt::test]
async fn undelivered_items_cannot_be_returned() {
  let pool = test_pool().await;
  let user_id = Uuid::new_v4();
  let lamp = seed_product(&pool, "Desk Lamp", 10_000, 10).await;
  let outcome = checkout::checkout(&pool, user_id, vec![line(lamp, 1, 10_000)], Some(&shipping()), None, 0)
    .await
    .expect("checkout");

  let item_id: Uuid = sqlx::query_scalar("SELECT id FROM order_items WHERE order_id = ?")
    .bind(outcome.order_id)
    .fetch_one(&pool)
    .await
    .unwrap();
  let err = returns::request_item_return(&pool, user_id, item_id, None).await.expect_err("not delivered");
  assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);
}

#[actix_rt::test]
async fn return_flow_issues_exactly_one_refund_and_restocks() {
  let pool = test_pool().await;
  let user_id = Uuid::new_v4();
  let lamp = seed_product(&pool, "Desk Lamp", 10_000, 10).await;
  let order_id = checkout_delivered_order(&pool, user_id, lamp).await;
  let payment_id = record_card_payment(&pool, user_id, order_id, 20_000).await;
  assert_eq!(stock_of(&pool, lamp).await, 8);

  let item_id: Uuid = sqlx::query_scalar("SELECT id FROM order_items WHERE order_id = ?")
    .bind(order_id)
    .fetch_one(&pool)
    .await
    .unwrap();

  let opened = returns::request_item_return(&pool, user_id, item_id, Some("Arrived broken".to_string()))
    .await
    .expect("return request");
  assert_eq!(opened.status, ReturnStatus::Requested);
  assert_eq!(order_status_of(&pool, order_id).await, OrderStatus::RefundWaiting);

  // A second request on the same item is refused while the first is open.
  let err = returns::request_item_return(&pool, user_id, item_id, None).await.expect_err("duplicate");
  assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);

  let decided = returns::decide_return(&pool, opened.return_id, ReturnStatus::Accepted).await.expect("accept");
  assert_eq!(decided.status, ReturnStatus::Accepted);
  assert!(decided.refund.is_none());

  returns::decide_return(&pool, opened.return_id, ReturnStatus::Received).await.expect("receive");

  let settled = returns::decide_return(&pool, opened.return_id, ReturnStatus::Refunded).await.expect("refund");
  let issued = settled.refund.expect("refund issued");
  assert_eq!(issued.payment_id, payment_id);
  assert_eq!(issued.amount_cents, 20_000);
  assert_eq!(stock_of(&pool, lamp).await, 10);
  assert_eq!(order_status_of(&pool, order_id).await, OrderStatus::Refunded);
  assert_eq!(delivery_status_of(&pool, order_id).await, DeliveryStatus::Refunded);

  // Settled requests take no further decisions; nothing restocks twice.
  let err = returns::decide_return(&pool, opened.return_id, ReturnStatus::Refunded).await.expect_err("settled");
  assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);
  assert_eq!(stock_of(&pool, lamp).await, 10);

  let refund_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM refunds").fetch_one(&pool).await.unwrap();
  assert_eq!(refund_count, 1);
}

#[actix_rt::test]
async fn refund_decision_without_a_payment_rolls_back() {
  let pool = test_pool().await;
  let user_id = Uuid::new_v4();
  let lamp = seed_product(&pool, "Desk Lamp", 10_000, 10).await;
  let order_id = checkout_delivered_order(&pool, user_id, lamp).await;

  let item_id: Uuid = sqlx::query_scalar("SELECT id FROM order_items WHERE order_id = ?")
    .bind(order_id)
    .fetch_one(&pool)
    .await
    .unwrap();
  let opened = returns::request_item_return(&pool, user_id, item_id, None).await.expect("return request");

  let err = returns::decide_return(&pool, opened.return_id, ReturnStatus::Refunded).await.expect_err("no payment");
  assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);

  // The whole decision rolled back: status, stock and order are untouched.
  let status: ReturnStatus = sqlx::query_scalar("SELECT status FROM return_requests WHERE id = ?")
    .bind(opened.return_id)
    .fetch_one(&pool)
    .await
    .unwrap();
  assert_eq!(status, ReturnStatus::Requested);
  assert_eq!(stock_of(&pool, lamp).await, 8);
  assert_eq!(order_status_of(&pool, order_id).await, OrderStatus::RefundWaiting);
}

#[actix_rt::test]
async fn rejection_leaves_stock_alone() {
  let pool = test_pool().await;
  let user_id = Uuid::new_v4();
  let lamp = seed_product(&pool, "Desk Lamp", 10_000, 10).await;
  let order_id = checkout_delivered_order(&pool, user_id, lamp).await;

  let item_id: Uuid = sqlx::query_scalar("SELECT id FROM order_items WHERE order_id = ?")
    .bind(order_id)
    .fetch_one(&pool)
    .await
    .unwrap();
  let opened = returns::request_item_return(&pool, user_id, item_id, None).await.expect("return request");

  let decided = returns::decide_return(&pool, opened.return_id, ReturnStatus::Rejected).await.expect("reject");
  assert_eq!(decided.status, ReturnStatus::Rejected);
  assert!(decided.refund.is_none());
  assert_eq!(stock_of(&pool, lamp).await, 8);
  assert_eq!(order_status_of(&pool, order_id).await, OrderStatus::RefundRejected);
}

#[actix_rt::test]
async fn rejection_does_not_block_a_new_request() {
  let pool = test_pool().await;
  let user_id = Uuid::new_v4();
  let lamp = seed_product(&pool, "Desk Lamp", 10_000, 10).await;
  let order_id = checkout_delivered_order(&pool, user_id, lamp).await;

  let item_id: Uuid = sqlx::query_scalar("SELECT id FROM order_items WHERE order_id = ?")
    .bind(order_id)
    .fetch_one(&pool)
    .await
    .unwrap();
  let first = returns::request_item_return(&pool, user_id, item_id, Some("Too small".to_string()))
    .await
    .expect("first request");
  returns::decide_return(&pool, first.return_id, ReturnStatus::Rejected).await.expect("reject");
  assert_eq!(order_status_of(&pool, order_id).await, OrderStatus::RefundRejected);

  // A rejected request is inactive; the same item can be contested again.
  let second = returns::request_item_return(&pool, user_id, item_id, Some("Still too small".to_string()))
    .await
    .expect("second request");
  assert_eq!(second.status, ReturnStatus::Requested);
  assert_ne!(second.return_id, first.return_id);
  assert_eq!(order_status_of(&pool, order_id).await, OrderStatus::RefundWaiting);

  let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM return_requests WHERE order_item_id = ?")
    .bind(item_id)
    .fetch_one(&pool)
    .await
    .unwrap();
  assert_eq!(count, 2);
}

#[actix_rt::test]
async fn overflowing_totals_are_rejected_before_any_write() {
  let pool = test_pool().await;
  let lamp = seed_product(&pool, "Desk Lamp", i64::MAX / 2, 10).await;

  let err = checkout::checkout(
    &pool,
    Uuid::new_v4(),
    vec![line(lamp, 3, i64::MAX / 2)],
    Some(&shipping()),
    None,
    0,
  )
  .await
  .expect_err("overflowing total");
  assert!(matches!(err, AppError::Validation(_)), "got {:?}", err);

  assert_eq!(stock_of(&pool, lamp).await, 10);
  let order_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders").fetch_one(&pool).await.unwrap();
  assert_eq!(order_count, 0);
}

#[actix_rt::test]
async fn payment_records_deduplicate_on_transaction_ref() {
  let pool = test_pool().await;
  let user_id = Uuid::new_v4();
  let lamp = seed_product(&pool, "Desk Lamp", 10_000, 10).await;
  let outcome = checkout::checkout(&pool, user_id, vec![line(lamp, 1, 10_000)], Some(&shipping()), None, 0)
    .await
    .expect("checkout");

  let req = || RecordPayment {
    order_id: outcome.order_id,
    amount_cents: 10_000,
    method: "card".to_string(),
    status: Some("paid".to_string()),
    paid_at: Some(Utc::now()),
    transaction_ref: Some("txn-retry".to_string()),
    card: None,
  };

  let first = payments::record_payment(&pool, None, user_id, req()).await.expect("first");
  assert!(!first.deduplicated);
  let second = payments::record_payment(&pool, None, user_id, req()).await.expect("retry");
  assert!(second.deduplicated);
  assert_eq!(second.payment_id, first.payment_id);

  let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments").fetch_one(&pool).await.unwrap();
  assert_eq!(count, 1);
}

#[actix_rt::test]
async fn payment_against_a_missing_order_is_not_found() {
  let pool = test_pool().await;
  let err = payments::record_payment(
    &pool,
    None,
    Uuid::new_v4(),
    RecordPayment {
      order_id: Uuid::new_v4(),
      amount_cents: 1_000,
      method: "card".to_string(),
      status: None,
      paid_at: None,
      transaction_ref: None,
      card: None,
    },
  )
  .await
  .expect_err("missing order");
  assert!(matches!(err, AppError::NotFound(_)), "got {:?}", err);
}

#[actix_rt::test]
async fn failed_notification_dispatch_never_reaches_the_caller() {
  let pool = test_pool().await;
  let user_id = Uuid::new_v4();
  let lamp = seed_product(&pool, "Desk Lamp", 10_000, 10).await;

  let outcome = checkout::checkout(&pool, user_id, vec![line(lamp, 1, 10_000)], Some(&shipping()), None, 0)
    .await
    .expect("checkout");

  let state = AppState {
    db_pool: pool.clone(),
    config: Arc::new(AppConfig {
      server_host: "127.0.0.1".to_string(),
      server_port: 0,
      database_url: "sqlite::memory:".to_string(),
      payment_encryption_key: None,
      notification_sender: "noreply@test.example".to_string(),
    }),
    notifier: Arc::new(FailingNotifier),
    card_cipher: None,
  };

  // The mutation committed before the event existed; a notifier that always
  // fails must not unwind anything or surface anywhere.
  notifications::dispatch(
    &state,
    OrderEvent {
      kind: OrderEventKind::CheckoutCompleted,
      order_id: outcome.order_id,
      user_id,
      amount_cents: outcome.total_amount_cents,
    },
  );
  tokio::time::sleep(std::time::Duration::from_millis(50)).await;

  assert_eq!(order_status_of(&pool, outcome.order_id).await, OrderStatus::Processing);
  assert_eq!(stock_of(&pool, lamp).await, 9);
}

#[actix_rt::test]
async fn listings_embed_items_and_labels() {
  let pool = test_pool().await;
  let user_id = Uuid::new_v4();
  let other_user = Uuid::new_v4();
  let lamp = seed_product(&pool, "Desk Lamp", 10_000, 10).await;
  let mug = seed_product(&pool, "Mug", 5_000, 5).await;

  checkout::checkout(&pool, user_id, vec![line(lamp, 1, 10_000)], Some(&shipping()), None, 0)
    .await
    .expect("checkout");
  checkout::checkout(&pool, other_user, vec![line(mug, 1, 5_000)], Some(&shipping()), None, 0)
    .await
    .expect("checkout");

  let all = orders::list_orders(&pool, None).await.expect("list all");
  assert_eq!(all.len(), 2);

  let mine = orders::list_orders(&pool, Some(user_id)).await.expect("list mine");
  assert_eq!(mine.len(), 1);
  assert_eq!(mine[0].status_label, "Processing");
  assert_eq!(mine[0].items.len(), 1);
  assert_eq!(mine[0].items[0].product_name, "Desk Lamp");

  let order_id = checkout_delivered_order(&pool, user_id, lamp).await;
  let item_id: Uuid = sqlx::query_scalar("SELECT id FROM order_items WHERE order_id = ?")
    .bind(order_id)
    .fetch_one(&pool)
    .await
    .unwrap();
  returns::request_item_return(&pool, user_id, item_id, Some("Wrong color".to_string()))
    .await
    .expect("return request");

  let queue = returns::list_return_requests(&pool, None).await.expect("queue");
  assert_eq!(queue.len(), 1);
  assert_eq!(queue[0].product_name, "Desk Lamp");
  assert_eq!(queue[0].return_status, ReturnStatus::Requested);
  assert!(queue[0].return_eligible);

  let none = returns::list_return_requests(&pool, Some(other_user)).await.expect("filtered");
  assert!(none.is_empty());
}
