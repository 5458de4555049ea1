// tests/scheduler_timers.rs
//
// Timer behaviour under paused tokio time: an immediate first check, one
// check per interval afterwards, independent sources and a clean stop.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{page_source, FakeAdapter, MemoryStore, RecordingNotifier};
use source_watch::{CheckCoordinator, Scheduler};

const MINUTE: Duration = Duration::from_secs(60);

fn setup() -> (Arc<FakeAdapter>, Arc<RecordingNotifier>, Arc<CheckCoordinator>) {
    let adapter = Arc::new(FakeAdapter::new());
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let coord = Arc::new(CheckCoordinator::new(
        adapter.clone(),
        store,
        notifier.clone(),
    ));
    (adapter, notifier, coord)
}

#[tokio::test(start_paused = true)]
async fn first_check_runs_immediately() {
    let (adapter, _notifier, coord) = setup();
    adapter.returns("news", "A", "https://x/a");
    adapter.returns("patchnotes", "P1", "https://x/p1");

    let scheduler = Scheduler::start(
        coord,
        &[page_source("news", 1440), page_source("patchnotes", 360)],
    );
    assert_eq!(scheduler.len(), 2);

    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(adapter.calls("news"), 1);
    assert_eq!(adapter.calls("patchnotes"), 1);

    scheduler.stop();
}

#[tokio::test(start_paused = true)]
async fn each_source_follows_its_own_interval() {
    let (adapter, _notifier, coord) = setup();
    adapter.returns("fast", "A", "https://x/a");
    adapter.returns("slow", "B", "https://x/b");

    let scheduler = Scheduler::start(coord, &[page_source("fast", 1), page_source("slow", 3)]);

    tokio::time::sleep(Duration::from_millis(1)).await;
    tokio::time::sleep(MINUTE).await;
    assert_eq!(adapter.calls("fast"), 2);
    assert_eq!(adapter.calls("slow"), 1);

    tokio::time::sleep(2 * MINUTE).await;
    assert_eq!(adapter.calls("fast"), 4);
    assert_eq!(adapter.calls("slow"), 2);

    scheduler.stop();
}

#[tokio::test(start_paused = true)]
async fn scheduled_change_is_announced_once() {
    let (adapter, notifier, coord) = setup();
    adapter.returns("news", "A", "https://x/a");
    adapter.returns("news", "B", "https://x/b");

    let scheduler = Scheduler::start(coord, &[page_source("news", 1)]);

    tokio::time::sleep(Duration::from_millis(1)).await;
    tokio::time::sleep(5 * MINUTE).await;

    assert_eq!(adapter.calls("news"), 6);
    assert_eq!(notifier.sent_titles(), vec!["B".to_string()]);

    scheduler.stop();
}

#[tokio::test(start_paused = true)]
async fn stop_cancels_future_checks() {
    let (adapter, _notifier, coord) = setup();
    adapter.returns("news", "A", "https://x/a");

    let scheduler = Scheduler::start(coord, &[page_source("news", 1)]);
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(adapter.calls("news"), 1);

    scheduler.stop();
    tokio::time::sleep(10 * MINUTE).await;
    assert_eq!(adapter.calls("news"), 1);
}
