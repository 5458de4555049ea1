// src/gateway.rs
//! Manual "check all sources now" command.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::MonitoredSource;
use crate::coordinator::{CheckCoordinator, CycleResult, Trigger};
use crate::error::FetchError;

pub const PERMISSION_DENIED_MESSAGE: &str = "⛔ You do not have permission to execute this command";

/// Who asked for the check, as reported by the chat bridge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requester {
    pub id: String,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub source_id: String,
    pub label: String,
    pub result: CycleResult,
}

impl SourceReport {
    /// Non-technical reply line for the requester.
    pub fn message(&self) -> String {
        let label = &self.label;
        match &self.result {
            CycleResult::Announced { .. } => format!("✅ {label}: new item found and announced"),
            CycleResult::NoChange => format!("ℹ️ {label}: no new item"),
            CycleResult::FetchFailed(FetchError::Busy) => {
                format!("⏳ {label}: a check is already running")
            }
            CycleResult::FetchFailed(_) => format!("❌ {label}: fetch failed"),
            CycleResult::PersistFailed(_) => {
                format!("❌ {label}: could not record the latest item")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManualCheckOutcome {
    Unauthorized,
    Completed(Vec<SourceReport>),
}

impl ManualCheckOutcome {
    pub fn render(&self) -> String {
        match self {
            ManualCheckOutcome::Unauthorized => PERMISSION_DENIED_MESSAGE.to_string(),
            ManualCheckOutcome::Completed(reports) => reports
                .iter()
                .map(SourceReport::message)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// JSON row of a completed manual check.
#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub source: String,
    pub outcome: &'static str,
    pub message: String,
}

impl From<&SourceReport> for ReportRow {
    fn from(r: &SourceReport) -> Self {
        Self {
            source: r.source_id.clone(),
            outcome: r.result.outcome(),
            message: r.message(),
        }
    }
}

pub struct CommandGateway {
    coordinator: Arc<CheckCoordinator>,
    sources: Arc<[MonitoredSource]>,
    allowed_roles: HashSet<String>,
}

impl CommandGateway {
    pub fn new(
        coordinator: Arc<CheckCoordinator>,
        sources: Arc<[MonitoredSource]>,
        allowed_roles: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            coordinator,
            sources,
            allowed_roles: allowed_roles.into_iter().collect(),
        }
    }

    /// At least one allow-listed role; an empty allow-list admits nobody.
    pub fn is_authorized(&self, requester: &Requester) -> bool {
        requester
            .roles
            .iter()
            .any(|r| self.allowed_roles.contains(r.trim()))
    }

    /// Run a manual cycle for every source, in configuration order.
    pub async fn handle_manual_check(&self, requester: &Requester) -> ManualCheckOutcome {
        if !self.is_authorized(requester) {
            warn!(requester = %requester.id, "manual check denied");
            return ManualCheckOutcome::Unauthorized;
        }

        info!(requester = %requester.id, sources = self.sources.len(), "manual check");
        let mut reports = Vec::with_capacity(self.sources.len());
        for source in self.sources.iter() {
            let result = self.coordinator.run_cycle(source, Trigger::Manual).await;
            reports.push(SourceReport {
                source_id: source.id.clone(),
                label: source.label().to_string(),
                result,
            });
        }
        ManualCheckOutcome::Completed(reports)
    }
}
