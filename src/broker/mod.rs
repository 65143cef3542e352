//! Worker pool polling the accrual service and reconciling order state.
//!
//! `worker_number + 1` symmetric workers consume the shared `pending` queue.
//! Each popped order is polled at most once every `min_poll_interval`,
//! honoring server-requested `Retry-After` backoff; outcomes route back to
//! `pending` or on to `completed` per the per-order state machine.

pub mod queue;
mod worker;

use std::sync::Arc;

use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinSet;
use tokio::time::Duration;
use tracing::{info, warn};

use crate::accrual::AccrualApi;
use crate::ledger::OrderUpdate;

use self::queue::WorkItem;
use self::worker::Worker;

/// Tuning knobs for the worker pool.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Base worker count; the pool runs `worker_number + 1` loops.
    pub worker_number: usize,
    /// Consecutive failures tolerated per order before giving up.
    pub retry_limit: u32,
    /// Minimum spacing between polls of the same order.
    pub min_poll_interval: Duration,
    /// Pause before re-pushing items that are not yet due.
    pub requeue_tick: Duration,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            worker_number: 7,
            retry_limit: 5,
            min_poll_interval: Duration::from_secs(10),
            requeue_tick: Duration::from_millis(100),
        }
    }
}

/// Handle over the running pool.
pub struct Broker {
    workers: JoinSet<()>,
}

impl Broker {
    /// Spawns the workers over the shared queues. The `completed` sender is
    /// consumed here so the queue closes exactly when the last worker exits.
    pub fn spawn(
        cfg: BrokerConfig,
        client: Arc<dyn AccrualApi>,
        pending_tx: mpsc::Sender<WorkItem>,
        pending_rx: Arc<Mutex<mpsc::Receiver<WorkItem>>>,
        completed_tx: mpsc::Sender<OrderUpdate>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let mut workers = JoinSet::new();
        for id in 0..cfg.worker_number + 1 {
            let worker = Worker {
                id,
                cfg: cfg.clone(),
                client: Arc::clone(&client),
                pending_tx: pending_tx.clone(),
                pending_rx: Arc::clone(&pending_rx),
                completed_tx: completed_tx.clone(),
                shutdown: shutdown.clone(),
            };
            workers.spawn(worker.run());
        }
        info!(
            workers = cfg.worker_number + 1,
            "started listening to queue for unprocessed orders"
        );
        Broker { workers }
    }

    /// Drains the pool, aborting workers that outlive `timeout`.
    pub async fn join(mut self, timeout: Duration) {
        let drain = async {
            while self.workers.join_next().await.is_some() {}
        };
        if tokio::time::timeout(timeout, drain).await.is_err() {
            warn!("worker pool did not drain in time, aborting remaining workers");
            self.workers.abort_all();
        }
        info!("stopped listening to queue for unprocessed orders");
    }
}
