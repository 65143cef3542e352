//! Persistent transactional ledger: users, balances, orders, withdrawals.

pub mod error;
pub mod models;
pub mod persister;
pub mod store;

pub use error::StoreError;
pub use models::{OrderRecord, OrderStatus, OrderUpdate, WithdrawalRecord};
pub use store::{Ledger, PgStore};
