// src/change_detector.rs
use crate::ingest::types::LatestItem;

/// Is `current` a new event relative to the last recorded item?
///
/// No previous record counts as new; the coordinator decides whether a cold
/// start is announced. Otherwise only the title matters: exact,
/// case-sensitive, no normalization beyond what the adapter already did.
pub fn is_new(previous: Option<&LatestItem>, current: &LatestItem) -> bool {
    match previous {
        None => true,
        Some(prev) => prev.title != current.title,
    }
}
