//! Runs one manual-style check for every configured source and prints the
//! reply lines a requester would see. Uses the real state files and webhooks.

use anyhow::Result;
use source_watch::{init_tracing, Trigger, WatchConfig, WatchService};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let service = WatchService::from_config(WatchConfig::load_default()?)?;

    for source in service.sources.iter() {
        let result = service.coordinator.run_cycle(source, Trigger::Manual).await;
        let report = source_watch::gateway::SourceReport {
            source_id: source.id.clone(),
            label: source.label().to_string(),
            result,
        };
        println!("{}", report.message());
    }

    Ok(())
}
