// src/api.rs
//! HTTP surface for the manual trigger.
//!
//! The chat bridge in front of this service forwards a slash command as
//! `POST /update`, passing the caller's identity in `x-requester-id` and a
//! comma-separated role list in `x-requester-roles`.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::gateway::{
    CommandGateway, ManualCheckOutcome, ReportRow, Requester, PERMISSION_DENIED_MESSAGE,
};

pub const HEADER_REQUESTER_ID: &str = "x-requester-id";
pub const HEADER_REQUESTER_ROLES: &str = "x-requester-roles";

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<CommandGateway>,
    /// `None` when no recorder is installed; `/metrics` then answers 404.
    pub metrics: Option<PrometheusHandle>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/update", post(manual_update))
        .route("/metrics", get(render_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct UpdateResp {
    results: Vec<ReportRow>,
    summary: String,
}

#[derive(Serialize)]
struct ErrorResp {
    error: &'static str,
}

async fn manual_update(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let requester = requester_from_headers(&headers);
    let outcome = state.gateway.handle_manual_check(&requester).await;

    match &outcome {
        ManualCheckOutcome::Unauthorized => (
            StatusCode::FORBIDDEN,
            Json(ErrorResp {
                error: PERMISSION_DENIED_MESSAGE,
            }),
        )
            .into_response(),
        ManualCheckOutcome::Completed(reports) => Json(UpdateResp {
            results: reports.iter().map(ReportRow::from).collect(),
            summary: outcome.render(),
        })
        .into_response(),
    }
}

async fn render_metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn requester_from_headers(headers: &HeaderMap) -> Requester {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .trim()
            .to_string()
    };

    Requester {
        id: header(HEADER_REQUESTER_ID),
        roles: header(HEADER_REQUESTER_ROLES)
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect(),
    }
}
