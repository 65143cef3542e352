//! Row types and the order status domain.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Ledger-side order lifecycle. `Processed` and `Invalid` are terminal:
/// once reached, the order leaves the polling cycle for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    New,
    Processing,
    Invalid,
    Processed,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Processed | Self::Invalid)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Processing => "PROCESSING",
            Self::Invalid => "INVALID",
            Self::Processed => "PROCESSED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(Self::New),
            "PROCESSING" => Ok(Self::Processing),
            "INVALID" => Ok(Self::Invalid),
            "PROCESSED" => Ok(Self::Processed),
            other => Err(format!("unknown order status {other:?}")),
        }
    }
}

/// One row of the orders table.
#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub user_id: String,
    pub order_number: i64,
    pub status: OrderStatus,
    pub accrual: Decimal,
    pub created_at: DateTime<Utc>,
}

/// One row of the withdrawals table.
#[derive(Debug, Clone)]
pub struct WithdrawalRecord {
    pub user_id: String,
    pub order_number: i64,
    pub amount: Decimal,
    pub processed_at: DateTime<Utc>,
}

/// Reconciled state for one order, queued for transactional persistence.
///
/// Applying the same `(status, accrual)` pair twice is a no-op.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderUpdate {
    pub user_id: String,
    pub order_number: i64,
    pub status: OrderStatus,
    pub accrual: Decimal,
}
