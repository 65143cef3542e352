use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::time::Duration;
use tracing::info;

use loyalty_gateway::accrual::{AccrualApi, AccrualClient};
use loyalty_gateway::broker::{queue, Broker, BrokerConfig};
use loyalty_gateway::config::AppConfig;
use loyalty_gateway::gateway::{self, state::AppState};
use loyalty_gateway::ledger::{persister, Ledger, PgStore};
use loyalty_gateway::processor::Processor;
use loyalty_gateway::secretary::Secretary;
use loyalty_gateway::{logging, recovery};

/// Bound on both queues; generous enough to absorb failure storms.
const QUEUE_CAPACITY: usize = 1024;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = AppConfig::parse();
    cfg.validate()?;
    logging::init(&cfg.log_level);

    let store = PgStore::connect(&cfg.database_uri)
        .await
        .context("could not prepare a DB connection")?;
    store.migrate().await.context("could not create DB tables")?;
    let pool = store.pool().clone();
    let store: Arc<dyn Ledger> = Arc::new(store);

    let secretary = Arc::new(Secretary::new(&cfg.secret_key));
    let accrual: Arc<dyn AccrualApi> = Arc::new(AccrualClient::new(&cfg.accrual_address));

    let queues = queue::order_queues(QUEUE_CAPACITY);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let broker = Broker::spawn(
        BrokerConfig {
            worker_number: cfg.worker_number,
            retry_limit: cfg.retry_number,
            ..BrokerConfig::default()
        },
        accrual,
        queues.pending_tx.clone(),
        queues.pending_rx,
        queues.completed_tx,
        shutdown_rx,
    );
    let persister = tokio::spawn(persister::run(Arc::clone(&store), queues.completed_rx));

    recovery::seed_pending(store.as_ref(), &queues.pending_tx)
        .await
        .context("could not retrieve stalled orders")?;

    let processor = Processor::new(Arc::clone(&store), Arc::clone(&secretary), queues.pending_tx);
    let app = gateway::router(Arc::new(AppState {
        processor,
        secretary,
    }));

    let bind_address = cfg.bind_address();
    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("could not bind {bind_address}"))?;
    info!(address = %bind_address, "server start attempted");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server failed")?;

    // Shutdown order: stop the workers, let the persister drain what the
    // workers already emitted, then release the pool.
    info!("server shutdown attempted");
    let _ = shutdown_tx.send(true);
    broker.join(SHUTDOWN_TIMEOUT).await;
    let _ = tokio::time::timeout(SHUTDOWN_TIMEOUT, persister).await;
    pool.close().await;
    info!("server shutdown succeeded");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "could not install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {},
        _ = terminate => {},
    }
}
