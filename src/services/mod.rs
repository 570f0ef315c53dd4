// src/services/mod.rs

//! Business operations. Each mutating service wraps its multi-table writes
//! in one transaction; HTTP handlers stay thin and dispatch the post-commit
//! notification events.

pub mod card_vault;
pub mod checkout;
pub mod inventory;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod returns;
