use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::probe::StatusReport;
use crate::state::AppState;

/// Infrastructure status. Served at both `/api/status` and
/// `/api/hadoop_status`.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusReport> {
    Json(state.prober.check_all(state.store.as_ref()).await)
}
