// src/coordinator.rs
//! One check cycle per call: fetch → compare → persist → notify.
//!
//! At most one cycle runs per source id at any time, whatever triggered it.
//! A second caller does not wait; it gets `FetchFailed(Busy)` because the
//! running cycle already covers its intent.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use metrics::{counter, gauge};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::change_detector::is_new;
use crate::config::MonitoredSource;
use crate::error::{DeliveryError, FetchError, StorageError};
use crate::ingest::types::{LatestItem, SourceAdapter};
use crate::notify::{Announcement, Notifier};
use crate::state::StateStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Automatic,
    Manual,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::Automatic => "automatic",
            Trigger::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleResult {
    NoChange,
    /// Persisted and handed to the notifier. A failed delivery is carried
    /// along but the item stays consumed.
    Announced {
        item: LatestItem,
        delivery_error: Option<DeliveryError>,
    },
    FetchFailed(FetchError),
    PersistFailed(StorageError),
}

impl CycleResult {
    pub fn outcome(&self) -> &'static str {
        match self {
            CycleResult::NoChange => "no_change",
            CycleResult::Announced { .. } => "announced",
            CycleResult::FetchFailed(FetchError::Busy) => "busy",
            CycleResult::FetchFailed(_) => "fetch_failed",
            CycleResult::PersistFailed(_) => "persist_failed",
        }
    }

    pub fn is_announced(&self) -> bool {
        matches!(self, CycleResult::Announced { .. })
    }
}

pub struct CheckCoordinator {
    adapter: Arc<dyn SourceAdapter>,
    store: Arc<dyn StateStore>,
    notifier: Arc<dyn Notifier>,
    locks: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CheckCoordinator {
    pub fn new(
        adapter: Arc<dyn SourceAdapter>,
        store: Arc<dyn StateStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            adapter,
            store,
            notifier,
            locks: StdMutex::new(HashMap::new()),
        }
    }

    fn lock_for(&self, source_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(source_id.to_string()).or_default().clone()
    }

    pub async fn run_cycle(&self, source: &MonitoredSource, trigger: Trigger) -> CycleResult {
        let lock = self.lock_for(&source.id);
        let result = match lock.try_lock() {
            Ok(_guard) => self.run_locked(source, trigger).await,
            Err(_) => {
                debug!(source = %source.id, trigger = trigger.as_str(), "cycle already running");
                CycleResult::FetchFailed(FetchError::Busy)
            }
        };

        counter!(
            "watch_cycles_total",
            "source" => source.id.clone(),
            "outcome" => result.outcome()
        )
        .increment(1);
        gauge!("watch_last_cycle_ts", "source" => source.id.clone())
            .set(chrono::Utc::now().timestamp() as f64);

        result
    }

    async fn run_locked(&self, source: &MonitoredSource, trigger: Trigger) -> CycleResult {
        let id = source.id.as_str();

        let current = match self.adapter.fetch_latest(source).await {
            Ok(item) => item,
            Err(e) => {
                warn!(source = id, trigger = trigger.as_str(), error = %e, "fetch failed");
                counter!("watch_fetch_errors_total", "source" => source.id.clone()).increment(1);
                return CycleResult::FetchFailed(e);
            }
        };

        // Unreadable state must not look like a cold start, or the current
        // item would be re-announced once storage recovers.
        let previous = match self.store.load(id).await {
            Ok(prev) => prev,
            Err(e) => {
                error!(source = id, error = %e, "loading state failed");
                return CycleResult::PersistFailed(e);
            }
        };

        let Some(previous) = previous else {
            if let Err(e) = self.store.save(id, &current).await {
                error!(source = id, error = %e, "saving baseline failed");
                return CycleResult::PersistFailed(e);
            }
            info!(source = id, title = %current.title, "baseline recorded");
            return CycleResult::NoChange;
        };

        if !is_new(Some(&previous), &current) {
            debug!(source = id, title = %current.title, "no change");
            return CycleResult::NoChange;
        }

        // Persist before notifying: a lost save must not turn into a repeat
        // announcement next cycle.
        if let Err(e) = self.store.save(id, &current).await {
            error!(source = id, error = %e, "saving new item failed, not announcing");
            return CycleResult::PersistFailed(e);
        }

        let announcement = Announcement::for_item(source, &current);
        let delivery_error = match self
            .notifier
            .send(&source.destination, &announcement)
            .await
        {
            Ok(()) => {
                info!(source = id, trigger = trigger.as_str(), title = %current.title, "announced");
                None
            }
            Err(e) => {
                warn!(source = id, title = %current.title, error = %e, "announcement not delivered");
                counter!("watch_deliveries_failed_total", "source" => source.id.clone())
                    .increment(1);
                Some(e)
            }
        };

        CycleResult::Announced {
            item: current,
            delivery_error,
        }
    }
}
