// src/ingest/scheduler.rs
use std::sync::Arc;

use metrics::counter;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::config::MonitoredSource;
use crate::coordinator::{CheckCoordinator, CycleResult, Trigger};

/// Per-source recurring checks.
///
/// Each source gets its own task: one check right away, then one per
/// `interval_minutes`. Sources never wait on each other; overlap on the same
/// source is resolved by the coordinator's lock.
pub struct Scheduler {
    tasks: Vec<(String, JoinHandle<()>)>,
}

impl Scheduler {
    pub fn start(coordinator: Arc<CheckCoordinator>, sources: &[MonitoredSource]) -> Self {
        let tasks = sources
            .iter()
            .cloned()
            .map(|source| {
                let id = source.id.clone();
                let handle = tokio::spawn(run_source(coordinator.clone(), source));
                (id, handle)
            })
            .collect::<Vec<_>>();

        tracing::info!(target: "scheduler", sources = tasks.len(), "scheduler started");
        Self { tasks }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Abort all timers. A cycle in flight is dropped at its next await point.
    pub fn stop(self) {
        for (id, handle) in self.tasks {
            handle.abort();
            tracing::debug!(target: "scheduler", source = %id, "timer stopped");
        }
    }
}

async fn run_source(coordinator: Arc<CheckCoordinator>, source: MonitoredSource) {
    let mut ticker = interval(source.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        counter!("watch_scheduled_runs_total", "source" => source.id.clone()).increment(1);
        let result = coordinator.run_cycle(&source, Trigger::Automatic).await;
        log_outcome(&source, &result);
    }
}

fn log_outcome(source: &MonitoredSource, result: &CycleResult) {
    match result {
        CycleResult::NoChange => {
            tracing::debug!(target: "scheduler", source = %source.id, "no new item")
        }
        CycleResult::Announced {
            item,
            delivery_error: None,
        } => tracing::info!(target: "scheduler", source = %source.id, title = %item.title, "new item announced"),
        CycleResult::Announced {
            item,
            delivery_error: Some(e),
        } => tracing::warn!(
            target: "scheduler",
            source = %source.id,
            title = %item.title,
            error = %e,
            "new item recorded but announcement failed"
        ),
        CycleResult::FetchFailed(e) => {
            tracing::warn!(target: "scheduler", source = %source.id, error = %e, "check skipped until next interval")
        }
        CycleResult::PersistFailed(e) => {
            tracing::error!(target: "scheduler", source = %source.id, error = %e, "state not persisted")
        }
    }
}
