// src/lib.rs
// Public library surface shared by the Shuttle entrypoint, the one-shot bin and tests.

pub mod api;
pub mod change_detector;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod gateway;
pub mod ingest;
pub mod metrics;
pub mod notify;
pub mod state;

use std::sync::Arc;

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusHandle;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ---- Re-exports for stable public API ----
pub use crate::config::{MonitoredSource, Origin, WatchConfig};
pub use crate::coordinator::{CheckCoordinator, CycleResult, Trigger};
pub use crate::gateway::{CommandGateway, ManualCheckOutcome, Requester};
pub use crate::ingest::scheduler::Scheduler;
pub use crate::ingest::types::{LatestItem, SourceAdapter};
pub use crate::notify::{Announcement, Notifier};
pub use crate::state::StateStore;

use crate::ingest::providers::{build_client, HttpSourceAdapter};
use crate::notify::DiscordNotifier;
use crate::state::JsonFileStore;

/// Compact fmt logs filtered by `RUST_LOG`, default `source_watch=info,warn`.
/// Uses `try_init` so it is a no-op when a runtime already installed a subscriber.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("source_watch=info,warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

/// Fully wired components for one configuration.
pub struct WatchService {
    pub config: WatchConfig,
    pub sources: Arc<[MonitoredSource]>,
    pub coordinator: Arc<CheckCoordinator>,
    pub gateway: Arc<CommandGateway>,
    pub metrics: Option<PrometheusHandle>,
}

impl WatchService {
    /// Production wiring: HTTP adapters, JSON file state, Discord webhooks.
    pub fn from_config(config: WatchConfig) -> Result<Self> {
        let client = build_client(config.request_timeout())?;
        let adapter = Arc::new(HttpSourceAdapter::with_client(client.clone()));
        let store = Arc::new(JsonFileStore::from_config(&config));
        let notifier = Arc::new(DiscordNotifier::new(client));
        Ok(Self::with_parts(config, adapter, store, notifier))
    }

    pub fn with_parts(
        config: WatchConfig,
        adapter: Arc<dyn SourceAdapter>,
        store: Arc<dyn StateStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let sources: Arc<[MonitoredSource]> = config.sources.clone().into();
        let coordinator = Arc::new(CheckCoordinator::new(adapter, store, notifier));
        let gateway = Arc::new(CommandGateway::new(
            coordinator.clone(),
            sources.clone(),
            config.allowed_roles.clone(),
        ));
        Self {
            config,
            sources,
            coordinator,
            gateway,
            metrics: None,
        }
    }

    /// Serve `/metrics` from this recorder handle.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Start per-source timers; each source is checked once immediately.
    pub fn start_scheduler(&self) -> Scheduler {
        Scheduler::start(self.coordinator.clone(), &self.sources)
    }

    pub fn router(&self) -> axum::Router {
        api::router(api::AppState {
            gateway: self.gateway.clone(),
            metrics: self.metrics.clone(),
        })
    }
}
