//! Accrual polling worker: one loop instance per pool slot.

use std::sync::Arc;

use tokio::sync::{mpsc, watch, Mutex};
use tokio::time::{sleep, Duration, Instant};
use tracing::{debug, info, warn};

use crate::accrual::{AccrualApi, AccrualError, AccrualReply, AccrualResponse};
use crate::ledger::{OrderStatus, OrderUpdate};

use super::queue::WorkItem;
use super::BrokerConfig;

/// Shutdown fired while the worker was waiting.
pub(super) struct Cancelled;

pub(super) struct Worker {
    pub id: usize,
    pub cfg: BrokerConfig,
    pub client: Arc<dyn AccrualApi>,
    pub pending_tx: mpsc::Sender<WorkItem>,
    pub pending_rx: Arc<Mutex<mpsc::Receiver<WorkItem>>>,
    pub completed_tx: mpsc::Sender<OrderUpdate>,
    pub shutdown: watch::Receiver<bool>,
}

/// What a poll outcome does with the work item.
#[derive(Debug)]
pub(super) enum Step {
    /// Item goes back to the pending tail.
    Requeue(WorkItem),
    /// Reconciled update goes to the completed queue; the order leaves the
    /// polling cycle.
    Complete(OrderUpdate),
    /// Non-terminal transition: the update is persisted and polling
    /// continues with the freshly seen status cached on the item.
    CompleteAndRequeue(OrderUpdate, WorkItem),
}

/// Applies the outcome table to one poll result.
pub(super) fn classify(
    mut item: WorkItem,
    reply: Result<AccrualReply, AccrualError>,
    retry_limit: u32,
    now: Instant,
) -> Step {
    let reply = match reply {
        Ok(reply) => reply,
        Err(_) => {
            warn!(order = item.order_number, "could not reach accrual service");
            return retry_or_give_up(item, retry_limit, now);
        }
    };

    match reply.status {
        429 => {
            let seconds = reply.retry_after.unwrap_or(0);
            warn!(
                order = item.order_number,
                seconds, "request delay, sending back to queue"
            );
            item.retry_after = Some(Duration::from_secs(seconds));
            item.last_checked = Some(now);
            Step::Requeue(item)
        }
        200 => {
            let parsed: AccrualResponse = match serde_json::from_slice(&reply.body) {
                Ok(parsed) => parsed,
                Err(err) => {
                    warn!(order = item.order_number, error = %err, "could not parse response body");
                    return retry_or_give_up(item, retry_limit, now);
                }
            };
            let new_status = OrderStatus::from(parsed.status);
            let new_accrual = parsed.accrual.unwrap_or_default();

            if new_status == item.status {
                debug!(order = item.order_number, "no updates, sending back to queue");
                item.last_checked = Some(now);
                item.retry_after = None;
                return Step::Requeue(item);
            }

            info!(
                order = item.order_number,
                status = %new_status,
                "updated, sending to DB"
            );
            let update = OrderUpdate {
                user_id: item.user_id.clone(),
                order_number: item.order_number,
                status: new_status,
                accrual: new_accrual,
            };
            if new_status.is_terminal() {
                Step::Complete(update)
            } else {
                // cache the freshly seen status so the next poll can take
                // the no-change branch
                item.status = new_status;
                item.accrual = new_accrual;
                item.last_checked = Some(now);
                item.retry_after = None;
                Step::CompleteAndRequeue(update, item)
            }
        }
        status => {
            warn!(
                order = item.order_number,
                status, "could not process, sending back to queue"
            );
            retry_or_give_up(item, retry_limit, now)
        }
    }
}

fn retry_or_give_up(mut item: WorkItem, retry_limit: u32, now: Instant) -> Step {
    if item.retry_count >= retry_limit {
        // abandon polling, preserving the ledger's last known state
        warn!(
            order = item.order_number,
            "abandoning due to retry limit exceeding"
        );
        Step::Complete(OrderUpdate {
            user_id: item.user_id.clone(),
            order_number: item.order_number,
            status: item.status,
            accrual: item.accrual,
        })
    } else {
        item.retry_count += 1;
        item.last_checked = Some(now);
        item.retry_after = None;
        Step::Requeue(item)
    }
}

impl Worker {
    pub(super) async fn run(mut self) {
        debug!(worker = self.id, "accrual worker started");
        loop {
            let item = {
                let mut rx = self.pending_rx.lock().await;
                tokio::select! {
                    _ = self.shutdown.wait_for(|stop| *stop) => None,
                    item = rx.recv() => item,
                }
            };
            let Some(item) = item else { break };
            if self.handle(item).await.is_err() {
                break;
            }
        }
        debug!(worker = self.id, "accrual worker stopped");
    }

    /// Processes one item. `Err` means shutdown fired mid-wait; the item is
    /// dropped and left to recovery.
    async fn handle(&mut self, mut item: WorkItem) -> Result<(), Cancelled> {
        // Server-requested backoff not yet elapsed: return the item to the
        // tail after a short tick so a queue of delayed orders does not spin.
        if let (Some(retry_after), Some(last)) = (item.retry_after, item.last_checked) {
            if last.elapsed() < retry_after {
                self.pause(self.cfg.requeue_tick).await?;
                self.requeue(item).await;
                return Ok(());
            }
        }

        // Minimum spacing between polls of the same order.
        if let Some(last) = item.last_checked {
            if let Some(wait) = self.cfg.min_poll_interval.checked_sub(last.elapsed()) {
                self.pause(wait).await?;
            }
        }

        let reply = tokio::select! {
            _ = self.shutdown.wait_for(|stop| *stop) => return Err(Cancelled),
            reply = self.client.get_accrual(item.order_number) => reply,
        };

        match classify(item, reply, self.cfg.retry_limit, Instant::now()) {
            Step::Requeue(item) => self.requeue(item).await,
            Step::Complete(update) => self.complete(update).await,
            Step::CompleteAndRequeue(update, item) => {
                self.complete(update).await;
                self.requeue(item).await;
            }
        }
        Ok(())
    }

    async fn pause(&mut self, duration: Duration) -> Result<(), Cancelled> {
        tokio::select! {
            _ = self.shutdown.wait_for(|stop| *stop) => Err(Cancelled),
            _ = sleep(duration) => Ok(()),
        }
    }

    /// Push to the pending tail without ever blocking the whole pool on a
    /// full queue.
    async fn requeue(&self, item: WorkItem) {
        let mut item = item;
        loop {
            match self.pending_tx.try_send(item) {
                Ok(()) => return,
                Err(mpsc::error::TrySendError::Full(returned)) => {
                    item = returned;
                    sleep(self.cfg.requeue_tick).await;
                    if *self.shutdown.borrow() {
                        return;
                    }
                }
                Err(mpsc::error::TrySendError::Closed(_)) => return,
            }
        }
    }

    async fn complete(&self, update: OrderUpdate) {
        if self.completed_tx.send(update).await.is_err() {
            warn!(
                worker = self.id,
                "completed queue closed before update could be delivered"
            );
        }
    }
}
