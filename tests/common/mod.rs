//! Shared test harness: in-memory ledger plus a router factory.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::mpsc;

use loyalty_gateway::broker::queue::WorkItem;
use loyalty_gateway::gateway::{router, state::AppState};
use loyalty_gateway::ledger::{
    Ledger, OrderRecord, OrderStatus, OrderUpdate, StoreError, WithdrawalRecord,
};
use loyalty_gateway::processor::Processor;
use loyalty_gateway::secretary::Secretary;

#[derive(Default)]
struct Inner {
    /// login -> (sealed password, user_id)
    users: Vec<(String, String, String)>,
    balances: Vec<(String, Decimal)>,
    orders: Vec<OrderRecord>,
    withdrawals: Vec<WithdrawalRecord>,
}

/// Hash-map-grade stand-in for the Postgres store, honoring the same
/// contract the trait documents.
#[derive(Default, Clone)]
pub struct MemoryLedger {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryLedger {
    /// Test hook: credit a balance directly, as a processed accrual would.
    pub fn credit(&self, user_id: &str, amount: Decimal) {
        let mut inner = self.inner.lock().unwrap();
        match inner.balances.iter_mut().find(|(id, _)| id == user_id) {
            Some((_, balance)) => *balance += amount,
            None => inner.balances.push((user_id.to_owned(), amount)),
        }
    }

    pub fn order_status(&self, order_number: i64) -> Option<OrderStatus> {
        self.inner
            .lock()
            .unwrap()
            .orders
            .iter()
            .find(|order| order.order_number == order_number)
            .map(|order| order.status)
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn create_user(
        &self,
        user_id: &str,
        login: &str,
        password: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.users.iter().any(|(existing, _, _)| existing == login) {
            return Err(StoreError::AlreadyExists(login.to_owned()));
        }
        inner
            .users
            .push((login.to_owned(), password.to_owned(), user_id.to_owned()));
        inner.balances.push((user_id.to_owned(), Decimal::ZERO));
        Ok(())
    }

    async fn check_user(&self, login: &str, password: &str) -> Result<String, StoreError> {
        let inner = self.inner.lock().unwrap();
        let (_, stored, user_id) = inner
            .users
            .iter()
            .find(|(existing, _, _)| existing == login)
            .ok_or(StoreError::NotFound)?;
        if stored != password {
            return Err(StoreError::NotFound);
        }
        Ok(user_id.clone())
    }

    async fn current_amount(&self, user_id: &str) -> Result<Decimal, StoreError> {
        self.inner
            .lock()
            .unwrap()
            .balances
            .iter()
            .find(|(id, _)| id == user_id)
            .map(|(_, amount)| *amount)
            .ok_or(StoreError::NotFound)
    }

    async fn withdrawn_total(&self, user_id: &str) -> Result<Decimal, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .withdrawals
            .iter()
            .filter(|w| w.user_id == user_id)
            .map(|w| w.amount)
            .sum())
    }

    async fn list_withdrawals(&self, user_id: &str) -> Result<Vec<WithdrawalRecord>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .withdrawals
            .iter()
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_orders(&self, user_id: &str) -> Result<Vec<OrderRecord>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .orders
            .iter()
            .filter(|order| order.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn add_order(&self, user_id: &str, order_number: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(existing) = inner
            .orders
            .iter()
            .find(|order| order.order_number == order_number)
        {
            return Err(if existing.user_id == user_id {
                StoreError::AlreadyExists(order_number.to_string())
            } else {
                StoreError::AlreadyExistsForOtherUser(order_number.to_string())
            });
        }
        inner.orders.push(OrderRecord {
            user_id: user_id.to_owned(),
            order_number,
            status: OrderStatus::New,
            accrual: Decimal::ZERO,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn add_withdrawal(
        &self,
        user_id: &str,
        order_number: i64,
        amount: Decimal,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .orders
            .iter()
            .any(|order| order.order_number == order_number)
            || inner
                .withdrawals
                .iter()
                .any(|w| w.order_number == order_number)
        {
            return Err(StoreError::AlreadyExists(order_number.to_string()));
        }
        let balance = inner
            .balances
            .iter_mut()
            .find(|(id, _)| id == user_id)
            .ok_or(StoreError::NotFound)?;
        if balance.1 < amount {
            return Err(StoreError::InsufficientFunds);
        }
        balance.1 -= amount;
        inner.orders.push(OrderRecord {
            user_id: user_id.to_owned(),
            order_number,
            status: OrderStatus::Processed,
            accrual: Decimal::ZERO,
            created_at: Utc::now(),
        });
        inner.withdrawals.push(WithdrawalRecord {
            user_id: user_id.to_owned(),
            order_number,
            amount,
            processed_at: Utc::now(),
        });
        Ok(())
    }

    async fn apply_update(&self, update: &OrderUpdate) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let order = inner
            .orders
            .iter_mut()
            .find(|order| order.order_number == update.order_number)
            .ok_or(StoreError::NotFound)?;
        if order.status == update.status && order.accrual == update.accrual {
            return Ok(());
        }
        order.status = update.status;
        order.accrual = update.accrual;
        if !update.accrual.is_zero() {
            if let Some((_, balance)) = inner
                .balances
                .iter_mut()
                .find(|(id, _)| id == &update.user_id)
            {
                *balance += update.accrual;
            }
        }
        Ok(())
    }

    async fn list_non_terminal_orders(&self) -> Result<Vec<OrderRecord>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .orders
            .iter()
            .filter(|order| !order.status.is_terminal())
            .cloned()
            .collect())
    }
}

pub struct Harness {
    pub app: axum::Router,
    pub ledger: MemoryLedger,
    pub pending_rx: mpsc::Receiver<WorkItem>,
}

pub fn harness() -> Harness {
    let ledger = MemoryLedger::default();
    let secretary = Arc::new(Secretary::new("test-secret"));
    let (pending_tx, pending_rx) = mpsc::channel(64);
    let processor = Processor::new(
        Arc::new(ledger.clone()),
        Arc::clone(&secretary),
        pending_tx,
    );
    let app = router(Arc::new(AppState {
        processor,
        secretary,
    }));
    Harness {
        app,
        ledger,
        pending_rx,
    }
}
