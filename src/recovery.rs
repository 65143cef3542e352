//! Startup pass that re-enqueues unfinished orders.

use tokio::sync::mpsc;
use tracing::info;

use crate::broker::queue::WorkItem;
use crate::ledger::{Ledger, StoreError};

/// Scans the ledger for non-terminal orders and seeds the pending queue.
///
/// Runs once, after the store is ready and before traffic is accepted.
/// Seeded items carry no `last_checked` timestamp, so their first poll is
/// immediate.
pub async fn seed_pending(
    store: &dyn Ledger,
    pending: &mpsc::Sender<WorkItem>,
) -> Result<usize, StoreError> {
    let stalled = store.list_non_terminal_orders().await?;
    let count = stalled.len();
    for order in stalled {
        let item = WorkItem::new(order.user_id, order.order_number, order.status);
        if pending.send(item).await.is_err() {
            break;
        }
    }
    info!(count, "stalled orders were sent for processing");
    Ok(count)
}
