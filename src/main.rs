//! Source watch binary entrypoint
//! Loads the watch config, starts per-source timers and serves the manual
//! trigger (`POST /update`) plus `/metrics` over Axum.

use anyhow::Context;
use shuttle_axum::ShuttleAxum;

use source_watch::metrics::Metrics;
use source_watch::{init_tracing, WatchConfig, WatchService};

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    // Webhook URLs and role ids are usually referenced as ENV:NAME from the config.
    let _ = dotenvy::dotenv();

    init_tracing();

    let config = WatchConfig::load_default().context("loading watch config")?;
    tracing::info!(
        sources = config.sources.len(),
        allowed_roles = config.allowed_roles.len(),
        state_dir = %config.state_dir.display(),
        "watch config loaded"
    );

    let metrics = Metrics::init(config.sources.len())?;
    let service = WatchService::from_config(config)?.with_metrics(metrics.handle);

    // Timers live for the whole process; the handle is intentionally not stopped.
    let scheduler = service.start_scheduler();
    tracing::info!(timers = scheduler.len(), "initial checks scheduled");

    Ok(service.router().into())
}
