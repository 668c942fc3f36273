//! Aggregate endpoints polled by the dashboard refresh loop. Both recompute
//! from the store on every request.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use salesdash_core::StatsSnapshot;
use salesdash_ingest::TickerMetricsSnapshot;

use crate::panels::{self, DashboardPanels};
use crate::state::AppState;

// ── /api/stats ───────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct StatsBody {
    #[serde(flatten)]
    pub stats: StatsSnapshot,
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct StatsError {
    pub error: String,
    pub timestamp: String,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum StatsResponse {
    Ok(StatsBody),
    Error(StatsError),
}

pub async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let now = Utc::now();
    let timestamp = now.to_rfc3339();
    let window = state.dashboard.realtime_window();

    match state.store.stats(now, window).await {
        Ok(stats) => Json(StatsResponse::Ok(StatsBody { stats, timestamp })),
        Err(e) => {
            warn!(error = %e, backend = state.store.backend_name(), "stats query failed");
            Json(StatsResponse::Error(StatsError {
                error: e.to_string(),
                timestamp,
            }))
        }
    }
}

// ── /api/dashboard ───────────────────────────────────────────────────

#[derive(Serialize)]
pub struct DashboardResponse {
    #[serde(flatten)]
    pub panels: DashboardPanels,
    pub ticker: Option<TickerMetricsSnapshot>,
    pub refresh_secs: u64,
    pub timestamp: String,
}

pub async fn dashboard(State(state): State<Arc<AppState>>) -> Json<DashboardResponse> {
    let panels = panels::load(state.store.as_ref(), state.dashboard.realtime_window()).await;
    Json(DashboardResponse {
        panels,
        ticker: state.ticker.as_ref().map(|m| m.snapshot()),
        refresh_secs: state.dashboard.refresh_secs,
        timestamp: Utc::now().to_rfc3339(),
    })
}
