//! Work queues shared between the request side, the recovery pass and the
//! worker pool.

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::{mpsc, Mutex};
use tokio::time::{Duration, Instant};

use crate::ledger::{OrderStatus, OrderUpdate};

/// One order currently in the polling cycle.
///
/// Lives only in the queues and the worker holding it; the ledger row is the
/// durable source of truth.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub user_id: String,
    pub order_number: i64,
    /// Last status this process saw for the order.
    pub status: OrderStatus,
    pub accrual: Decimal,
    /// Consecutive polling failures.
    pub retry_count: u32,
    /// None until the first poll, so fresh and recovered orders poll
    /// immediately.
    pub last_checked: Option<Instant>,
    /// Server-requested backoff from a 429 reply.
    pub retry_after: Option<Duration>,
}

impl WorkItem {
    pub fn new(user_id: String, order_number: i64, status: OrderStatus) -> Self {
        Self {
            user_id,
            order_number,
            status,
            accrual: Decimal::ZERO,
            retry_count: 0,
            last_checked: None,
            retry_after: None,
        }
    }
}

/// The two pipes of the pipeline: `pending` carries orders awaiting a poll,
/// `completed` carries reconciled updates awaiting persistence.
pub struct Queues {
    pub pending_tx: mpsc::Sender<WorkItem>,
    pub pending_rx: Arc<Mutex<mpsc::Receiver<WorkItem>>>,
    pub completed_tx: mpsc::Sender<OrderUpdate>,
    pub completed_rx: mpsc::Receiver<OrderUpdate>,
}

pub fn order_queues(capacity: usize) -> Queues {
    let (pending_tx, pending_rx) = mpsc::channel(capacity);
    let (completed_tx, completed_rx) = mpsc::channel(capacity);
    Queues {
        pending_tx,
        pending_rx: Arc::new(Mutex::new(pending_rx)),
        completed_tx,
        completed_rx,
    }
}
