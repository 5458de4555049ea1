// src/error.rs
//! Error taxonomy for the check pipeline.
//!
//! None of these escape a check cycle: the coordinator folds them into a
//! `CycleResult`, and the gateway turns those into reply lines.

use std::path::PathBuf;
use thiserror::Error;

/// A source could not produce its latest item.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Another cycle for the same source holds the lock.
    #[error("a check for this source is already running")]
    Busy,

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    /// Origin answered with a non-2xx status.
    #[error("HTTP error: {0}")]
    Status(u16),

    #[error("unparseable response: {0}")]
    Parse(String),

    /// Well-formed response without any item in it.
    #[error("source returned no items")]
    EmptyResult,
}

impl FetchError {
    pub fn is_busy(&self) -> bool {
        matches!(self, FetchError::Busy)
    }

    /// Short label used for metrics and JSON replies.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Busy => "busy",
            FetchError::Timeout => "timeout",
            FetchError::Network(_) => "network",
            FetchError::Status(_) => "status",
            FetchError::Parse(_) => "parse",
            FetchError::EmptyResult => "empty",
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = e.status() {
            FetchError::Status(status.as_u16())
        } else if e.is_decode() {
            FetchError::Parse(e.to_string())
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

/// Persisted state could not be read or written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("cannot read {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("cannot write {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    /// Record exists but does not hold a valid item.
    #[error("corrupt record {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

/// An announcement could not be delivered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("webhook request failed: {0}")]
    Network(String),

    #[error("webhook HTTP error: {0}")]
    Status(u16),
}

impl From<reqwest::Error> for DeliveryError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => DeliveryError::Status(status.as_u16()),
            None => DeliveryError::Network(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_display_is_readable() {
        assert_eq!(FetchError::Status(503).to_string(), "HTTP error: 503");
        assert_eq!(
            FetchError::EmptyResult.to_string(),
            "source returned no items"
        );
    }

    #[test]
    fn only_busy_is_busy() {
        assert!(FetchError::Busy.is_busy());
        assert!(!FetchError::Timeout.is_busy());
        assert_eq!(FetchError::Parse("x".into()).kind(), "parse");
    }

    #[test]
    fn storage_error_names_the_path() {
        let err = StorageError::Corrupt {
            path: PathBuf::from("shared/news.json"),
            reason: "expected value".into(),
        };
        assert!(err.to_string().contains("shared/news.json"));
    }
}
