//! Consumer of the completed queue.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use super::models::OrderUpdate;
use super::store::Ledger;

/// Drains `completed`, applying each update transactionally.
///
/// Individual failures are logged and skipped: the order stays in its
/// pre-failure state and is re-enqueued by recovery on the next start.
/// The loop ends once every producer has dropped its sender.
pub async fn run(store: Arc<dyn Ledger>, mut completed: mpsc::Receiver<OrderUpdate>) {
    info!("started listening to queue for processed orders");
    while let Some(update) = completed.recv().await {
        if let Err(err) = store.apply_update(&update).await {
            warn!(
                order = update.order_number,
                error = %err,
                "could not update order"
            );
        }
    }
    info!("stopped listening to queue for processed orders");
}
