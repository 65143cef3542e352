//! Request-side facade between the HTTP layer and the ledger store.
//!
//! Every store call runs under a per-request deadline; an elapsed deadline
//! surfaces as `StoreError::Timeout`.

use std::future::Future;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::Duration;
use tracing::info;

use crate::broker::queue::WorkItem;
use crate::ledger::{Ledger, OrderRecord, OrderStatus, StoreError, WithdrawalRecord};
use crate::luhn;
use crate::secretary::{Secretary, SecretaryError};

/// Per-request deadline for store operations.
const STORE_DEADLINE: Duration = Duration::from_millis(500);

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct BalanceView {
    pub current: Decimal,
    pub withdrawn: Decimal,
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("illegal order number {0}")]
    IllegalOrderNumber(String),

    #[error("invalid login or password")]
    Unauthorized,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Token(#[from] SecretaryError),
}

pub struct Processor {
    store: Arc<dyn Ledger>,
    secretary: Arc<Secretary>,
    pending: mpsc::Sender<WorkItem>,
    deadline: Duration,
}

impl Processor {
    pub fn new(
        store: Arc<dyn Ledger>,
        secretary: Arc<Secretary>,
        pending: mpsc::Sender<WorkItem>,
    ) -> Self {
        Self {
            store,
            secretary,
            pending,
            deadline: STORE_DEADLINE,
        }
    }

    async fn bounded<T>(
        &self,
        op: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.deadline, op).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout),
        }
    }

    /// Registers a user and returns a bearer token bound to the new id.
    pub async fn register(&self, credentials: &Credentials) -> Result<String, ProcessError> {
        let (token, user_id) = self.secretary.new_token()?;
        let login = self.secretary.seal(&credentials.login);
        let password = self.secretary.seal(&credentials.password);
        self.bounded(self.store.create_user(&user_id, &login, &password))
            .await?;
        Ok(token)
    }

    /// Checks credentials and mints a token for the stored user id.
    pub async fn login(&self, credentials: &Credentials) -> Result<String, ProcessError> {
        let login = self.secretary.seal(&credentials.login);
        let password = self.secretary.seal(&credentials.password);
        let user_id = match self.bounded(self.store.check_user(&login, &password)).await {
            Err(StoreError::NotFound) => return Err(ProcessError::Unauthorized),
            other => other?,
        };
        Ok(self.secretary.token_for_user(&user_id)?)
    }

    pub async fn get_balance(&self, user_id: &str) -> Result<BalanceView, ProcessError> {
        let current = self.bounded(self.store.current_amount(user_id)).await?;
        let withdrawn = self.bounded(self.store.withdrawn_total(user_id)).await?;
        Ok(BalanceView { current, withdrawn })
    }

    pub async fn get_orders(&self, user_id: &str) -> Result<Vec<OrderRecord>, ProcessError> {
        Ok(self.bounded(self.store.list_orders(user_id)).await?)
    }

    pub async fn get_withdrawals(
        &self,
        user_id: &str,
    ) -> Result<Vec<WithdrawalRecord>, ProcessError> {
        Ok(self.bounded(self.store.list_withdrawals(user_id)).await?)
    }

    /// Validates and records a new order, then seeds the polling queue.
    pub async fn add_new_order(
        &self,
        user_id: &str,
        order_number: &str,
    ) -> Result<(), ProcessError> {
        let number = parse_order_number(order_number)?;
        self.bounded(self.store.add_order(user_id, number)).await?;

        let item = WorkItem::new(user_id.to_owned(), number, OrderStatus::New);
        if self.pending.send(item).await.is_err() {
            // only happens during shutdown; recovery re-seeds on restart
            info!(order = number, "polling queue closed, order deferred to next start");
        }
        Ok(())
    }

    /// Validates the order number, pre-checks funds and records the
    /// withdrawal.
    pub async fn add_new_withdrawal(
        &self,
        user_id: &str,
        order_number: &str,
        amount: Decimal,
    ) -> Result<(), ProcessError> {
        let number = parse_order_number(order_number)?;

        let current = self.bounded(self.store.current_amount(user_id)).await?;
        if current < amount {
            return Err(ProcessError::Store(StoreError::InsufficientFunds));
        }

        self.bounded(self.store.add_withdrawal(user_id, number, amount))
            .await?;
        Ok(())
    }
}

fn parse_order_number(raw: &str) -> Result<i64, ProcessError> {
    if !luhn::is_valid(raw) {
        return Err(ProcessError::IllegalOrderNumber(raw.to_owned()));
    }
    raw.parse()
        .map_err(|_| ProcessError::IllegalOrderNumber(raw.to_owned()))
}
