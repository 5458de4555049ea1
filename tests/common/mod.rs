// tests/common/mod.rs
//
// In-memory fakes for the three seams of the check cycle, plus config helpers.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Notify, Semaphore};

use source_watch::error::{DeliveryError, FetchError, StorageError};
use source_watch::{
    Announcement, LatestItem, MonitoredSource, Notifier, Origin, SourceAdapter, StateStore,
    WatchConfig,
};

pub fn page_source(id: &str, interval_minutes: u64) -> MonitoredSource {
    MonitoredSource {
        id: id.to_string(),
        label: capitalize(id),
        origin: Origin::Page {
            url: format!("https://{id}.example.com/"),
        },
        destination: format!("https://discord.example.com/api/webhooks/{id}"),
        interval_minutes,
        state_file: None,
    }
}

pub fn config(sources: Vec<MonitoredSource>, allowed_roles: &[&str]) -> WatchConfig {
    WatchConfig {
        state_dir: PathBuf::from("unused"),
        request_timeout_secs: 5,
        allowed_roles: allowed_roles.iter().map(|r| r.to_string()).collect(),
        sources,
    }
}

fn capitalize(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        Some(f) => f.to_uppercase().chain(c).collect(),
        None => String::new(),
    }
}

/// Scripted adapter: pops the next scripted response per source, then keeps
/// repeating the last one.
#[derive(Default)]
pub struct FakeAdapter {
    script: Mutex<HashMap<String, VecDeque<Result<LatestItem, FetchError>>>>,
    last: Mutex<HashMap<String, Result<LatestItem, FetchError>>>,
    calls: Mutex<HashMap<String, usize>>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
    pub entered: Arc<Notify>,
}

impl FakeAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, source_id: &str, response: Result<LatestItem, FetchError>) {
        self.script
            .lock()
            .entry(source_id.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn returns(&self, source_id: &str, title: &str, link: &str) {
        self.push(source_id, Ok(LatestItem::new(title, link)));
    }

    /// Make fetches for `source_id` block until a permit is added. Permits are
    /// handed back after each fetch, so one `add_permits(1)` opens the gate
    /// for good.
    pub fn gate(&self, source_id: &str) -> Arc<Semaphore> {
        let sem = Arc::new(Semaphore::new(0));
        self.gates.lock().insert(source_id.to_string(), sem.clone());
        sem
    }

    pub fn calls(&self, source_id: &str) -> usize {
        self.calls.lock().get(source_id).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }
}

#[async_trait::async_trait]
impl SourceAdapter for FakeAdapter {
    async fn fetch_latest(&self, source: &MonitoredSource) -> Result<LatestItem, FetchError> {
        *self.calls.lock().entry(source.id.clone()).or_default() += 1;
        self.entered.notify_one();

        let gate = self.gates.lock().get(&source.id).cloned();
        if let Some(gate) = gate {
            let _open = gate.acquire().await.expect("gate closed");
        }

        let next = self
            .script
            .lock()
            .get_mut(&source.id)
            .and_then(|q| q.pop_front());
        match next {
            Some(r) => {
                self.last.lock().insert(source.id.clone(), r.clone());
                r
            }
            None => self
                .last
                .lock()
                .get(&source.id)
                .cloned()
                .unwrap_or(Err(FetchError::EmptyResult)),
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

#[derive(Default)]
pub struct MemoryStore {
    pub records: Mutex<HashMap<String, LatestItem>>,
    pub fail_load: Mutex<bool>,
    pub fail_save: Mutex<bool>,
    pub loads: AtomicUsize,
    pub saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(self, source_id: &str, title: &str, link: &str) -> Self {
        self.records
            .lock()
            .insert(source_id.to_string(), LatestItem::new(title, link));
        self
    }

    pub fn get(&self, source_id: &str) -> Option<LatestItem> {
        self.records.lock().get(source_id).cloned()
    }

    pub fn io_calls(&self) -> usize {
        self.loads.load(Ordering::SeqCst) + self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl StateStore for MemoryStore {
    async fn load(&self, source_id: &str) -> Result<Option<LatestItem>, StorageError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if *self.fail_load.lock() {
            return Err(StorageError::Corrupt {
                path: PathBuf::from(format!("{source_id}.json")),
                reason: "garbage".into(),
            });
        }
        Ok(self.get(source_id))
    }

    async fn save(&self, source_id: &str, item: &LatestItem) -> Result<(), StorageError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if *self.fail_save.lock() {
            return Err(StorageError::Write {
                path: PathBuf::from(format!("{source_id}.json")),
                reason: "disk full".into(),
            });
        }
        self.records
            .lock()
            .insert(source_id.to_string(), item.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, Announcement)>>,
    pub fail: Mutex<bool>,
    pub attempts: AtomicUsize,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent_titles(&self) -> Vec<String> {
        self.sent.lock().iter().map(|(_, a)| a.title.clone()).collect()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn send(
        &self,
        destination: &str,
        announcement: &Announcement,
    ) -> Result<(), DeliveryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if *self.fail.lock() {
            return Err(DeliveryError::Status(500));
        }
        self.sent
            .lock()
            .push((destination.to_string(), announcement.clone()));
        Ok(())
    }
}
