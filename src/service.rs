//! Process wiring: store selection, startup policy and the serve loop

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::adapters::{LocalBus, MatchPublisher, PostgresStore, SofascoreClient};
use crate::aggregator::{Aggregator, MatchSource};
use crate::api::{create_router, AppState};
use crate::broadcast::{spawn_bridge, Hub};
use crate::config::{AppConfig, DatabaseConfig};
use crate::coordination::{Shutdown, ShutdownToken};
use crate::domain::Match;
use crate::error::Result;
use crate::persistence::{MatchStore, MemoryStore};
use crate::scheduler::{CacheSweepJob, LiveSyncJob, ReferenceSyncJob, ScheduledJob, Scheduler};
use crate::simulation::SimulationEngine;

/// Which producer feeds the update queue after startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerMode {
    /// Real matches found; periodic fetch running
    Live { initial: usize },
    /// No real matches; simulator running
    Simulated,
    /// No real matches and the simulator is disabled
    Idle,
}

/// Postgres when a URL is configured, memory otherwise
pub async fn open_store(config: &DatabaseConfig) -> Result<Arc<dyn MatchStore>> {
    match &config.url {
        Some(url) => {
            let store = PostgresStore::new(url, config.max_connections).await?;
            if config.run_migrations {
                store.migrate().await?;
            }
            Ok(Arc::new(store))
        }
        None => {
            warn!("No database configured, keeping match state in memory");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Drop leftover simulator rows when the simulator is off
pub async fn cleanup_simulated(store: &dyn MatchStore, enable_simulator: bool) {
    if enable_simulator {
        return;
    }
    match store.delete_simulated().await {
        Ok(removed) => info!(removed, "Cleaned up simulated matches"),
        Err(e) => warn!(error = %e, "Failed to delete simulated matches"),
    }
}

/// Fetch once, then pick the producer.
///
/// Real matches are queued immediately and refreshed by the periodic fetch.
/// Otherwise the simulator runs if enabled, and state stays empty if not.
pub async fn start_producer(
    config: &AppConfig,
    aggregator: Arc<Aggregator>,
    store: Arc<dyn MatchStore>,
    publisher: Arc<dyn MatchPublisher>,
    out: mpsc::Sender<Match>,
    token: ShutdownToken,
) -> Result<(ProducerMode, Option<JoinHandle<()>>)> {
    let fetched = aggregator.fetch_live_matches(&token).await;

    match fetched {
        Ok(matches) if !matches.is_empty() => {
            let initial = matches.len();
            info!(count = initial, "Found real live matches, starting periodic fetch");
            for m in matches {
                if out.try_send(m).is_err() {
                    warn!("Update queue rejected an initial match");
                }
            }
            let handle = aggregator.start_periodic_fetch(token, out, config.live.fetch_interval());
            Ok((ProducerMode::Live { initial }, Some(handle)))
        }
        other => {
            if let Err(e) = other {
                warn!(error = %e, "Initial live fetch failed");
            }

            if config.live.enable_simulator {
                info!("No real live matches available, starting simulator");
                let mut engine =
                    SimulationEngine::new(config.simulation.clone(), store, publisher, out);
                engine.initialize().await;
                let handle = tokio::spawn(engine.run(token));
                Ok((ProducerMode::Simulated, Some(handle)))
            } else {
                info!("No real live matches available and simulator disabled; state stays empty");
                Ok((ProducerMode::Idle, None))
            }
        }
    }
}

/// Run the whole service until `shutdown` fires
pub async fn serve(config: AppConfig, shutdown: Arc<Shutdown>) -> Result<()> {
    let token = shutdown.token();
    let store = open_store(&config.database).await?;
    let sofascore = Arc::new(SofascoreClient::new(&config.provider)?);
    let provider: Arc<dyn MatchSource> = sofascore.clone();
    let aggregator = Arc::new(Aggregator::new(
        provider.clone(),
        store.clone(),
        config.live.rate_limit_interval(),
    ));
    let bus = Arc::new(LocalBus::default());

    let jobs: Vec<Arc<dyn ScheduledJob>> = vec![
        Arc::new(LiveSyncJob::new(provider, store.clone())),
        Arc::new(ReferenceSyncJob::new(sofascore, store.clone())),
        Arc::new(CacheSweepJob::new(aggregator.clone())),
    ];
    let scheduler = Arc::new(
        Scheduler::from_config(jobs, &config.scheduler).with_shutdown(token.clone()),
    );
    scheduler.start().await;

    cleanup_simulated(store.as_ref(), config.live.enable_simulator).await;

    let (hub, hub_task) = Hub::spawn(&config.hub, token.clone());
    let (updates_tx, updates_rx) = mpsc::channel(config.live.queue_capacity);
    let (mode, producer) = start_producer(
        &config,
        aggregator,
        store.clone(),
        bus,
        updates_tx,
        token.clone(),
    )
    .await?;
    info!(?mode, "Producer selected");
    let bridge = spawn_bridge(updates_rx, hub.clone(), token.clone());

    let state = AppState::new(store, hub).with_scheduler(scheduler.clone());
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = TcpListener::bind(addr).await?;
    info!("API server listening on http://{}", addr);

    let server_token = token.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { server_token.cancelled().await })
        .await?;

    info!("Shutting down gracefully...");
    scheduler.stop().await;
    if let Some(producer) = producer {
        let _ = producer.await;
    }
    let _ = bridge.await;
    let _ = hub_task.await;
    info!("Server stopped");
    Ok(())
}
