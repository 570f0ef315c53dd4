// src/models/mod.rs

//! Data structures representing database entities and the pure status
//! state machines they carry.

pub mod cart_item;
pub mod delivery;
pub mod order;
pub mod order_item;
pub mod payment;
pub mod product;
pub mod refund;
pub mod return_request;

pub use cart_item::CartItem;
pub use delivery::{Delivery, DeliveryStatus};
pub use order::{Order, OrderStatus};
pub use order_item::OrderItem;
pub use payment::{CardDetails, Payment};
pub use product::Product;
pub use refund::Refund;
pub use return_request::{ReturnRequest, ReturnStatus};
