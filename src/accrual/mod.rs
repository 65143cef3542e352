//! Client for the external accrual service.
//!
//! The client is stateless and shared across all workers. Cancellation is
//! propagated by the caller racing the request future against the shutdown
//! signal; dropping the future aborts the in-flight HTTP call.

pub mod client;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::ledger::OrderStatus;

pub use client::AccrualClient;

/// Raw reply from one accrual poll: HTTP status, body bytes and the
/// `Retry-After` hint when present.
#[derive(Debug, Clone)]
pub struct AccrualReply {
    pub status: u16,
    pub body: Vec<u8>,
    pub retry_after: Option<u64>,
}

#[derive(Debug, Error)]
pub enum AccrualError {
    #[error("accrual request failed: {0}")]
    Transport(String),
}

/// External order state as reported by the accrual service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccrualStatus {
    Registered,
    Processing,
    Invalid,
    Processed,
}

impl From<AccrualStatus> for OrderStatus {
    fn from(status: AccrualStatus) -> Self {
        match status {
            AccrualStatus::Registered => OrderStatus::New,
            AccrualStatus::Processing => OrderStatus::Processing,
            AccrualStatus::Invalid => OrderStatus::Invalid,
            AccrualStatus::Processed => OrderStatus::Processed,
        }
    }
}

/// Body of a 200 reply.
#[derive(Debug, Deserialize)]
pub struct AccrualResponse {
    pub order: String,
    pub status: AccrualStatus,
    #[serde(default)]
    pub accrual: Option<Decimal>,
}

/// One poll for one order.
///
/// Transport failures surface as `AccrualError`; HTTP-level failures are
/// carried in the reply status code and classified by the broker.
#[async_trait]
pub trait AccrualApi: Send + Sync {
    async fn get_accrual(&self, order_number: i64) -> Result<AccrualReply, AccrualError>;
}
