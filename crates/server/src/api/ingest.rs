use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use salesdash_ingest::TickerMetricsSnapshot;

use crate::state::AppState;

#[derive(Serialize)]
pub struct IngestResponse {
    pub enabled: bool,
    #[serde(flatten)]
    pub metrics: Option<TickerMetricsSnapshot>,
}

/// Ticker counters, or `{"enabled": false}` when the ticker is off.
pub async fn ingest_metrics(State(state): State<Arc<AppState>>) -> Json<IngestResponse> {
    Json(IngestResponse {
        enabled: state.ticker.is_some(),
        metrics: state.ticker.as_ref().map(|m| m.snapshot()),
    })
}
