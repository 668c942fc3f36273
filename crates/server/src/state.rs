use std::sync::Arc;

use chrono::{DateTime, Utc};

use salesdash_core::config::DashboardConfig;
use salesdash_ingest::TickerMetrics;
use salesdash_store::SharedStore;

use crate::probe::Prober;

/// Everything a request handler can reach. Built once in `serve` and shared
/// through `State<Arc<AppState>>`.
pub struct AppState {
    pub store: SharedStore,
    pub dashboard: DashboardConfig,
    pub prober: Prober,
    /// `None` when the ingestion ticker is disabled.
    pub ticker: Option<Arc<TickerMetrics>>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        store: SharedStore,
        dashboard: DashboardConfig,
        prober: Prober,
        ticker: Option<Arc<TickerMetrics>>,
    ) -> Self {
        Self {
            store,
            dashboard,
            prober,
            ticker,
            started_at: Utc::now(),
        }
    }
}
