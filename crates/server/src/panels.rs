//! One refresh cycle's worth of dashboard data.
//!
//! Every panel is loaded independently from the store. A failed or empty
//! query becomes a `no_data` panel carrying the reason; it never fails the
//! whole response.

use chrono::Duration;
use serde::Serialize;
use tracing::warn;

use salesdash_core::{CategoryBreakdown, RegionBreakdown, StatsSnapshot};
use salesdash_store::{StoreError, TransactionStore};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Panel<T> {
    Ok { data: T },
    NoData { reason: String },
}

impl<T> Panel<T> {
    fn from_result(name: &str, result: Result<T, StoreError>) -> Self {
        match result {
            Ok(data) => Panel::Ok { data },
            Err(e) => {
                warn!(panel = name, error = %e, "dashboard panel unavailable");
                Panel::NoData {
                    reason: e.to_string(),
                }
            }
        }
    }
}

impl<R> Panel<Vec<R>> {
    fn non_empty(self) -> Self {
        match self {
            Panel::Ok { data } if data.is_empty() => Panel::NoData {
                reason: "no sales recorded yet".to_string(),
            },
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardPanels {
    pub stats: Panel<StatsSnapshot>,
    pub categories: Panel<Vec<CategoryBreakdown>>,
    pub regions: Panel<Vec<RegionBreakdown>>,
}

/// Query all panels concurrently against the current store contents.
pub async fn load(store: &dyn TransactionStore, window: Duration) -> DashboardPanels {
    let now = chrono::Utc::now();
    let (stats, categories, regions) = tokio::join!(
        store.stats(now, window),
        store.category_breakdown(),
        store.region_breakdown(),
    );
    DashboardPanels {
        stats: Panel::from_result("stats", stats),
        categories: Panel::from_result("categories", categories).non_empty(),
        regions: Panel::from_result("regions", regions).non_empty(),
    }
}

// ── Bar rows ─────────────────────────────────────────────────────────

/// A row in an HTML bar chart: width is relative to the largest value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: String,
    pub orders: u64,
    pub revenue: f64,
    pub width_pct: f64,
}

fn bars(rows: impl Iterator<Item = (String, u64, f64)>) -> Vec<Bar> {
    let rows: Vec<_> = rows.collect();
    let max = rows.iter().map(|r| r.2).fold(0.0_f64, f64::max);
    rows.into_iter()
        .map(|(label, orders, revenue)| Bar {
            label,
            orders,
            revenue,
            width_pct: if max > 0.0 {
                (revenue / max * 1000.0).round() / 10.0
            } else {
                0.0
            },
        })
        .collect()
}

pub fn category_bars(rows: &[CategoryBreakdown]) -> Vec<Bar> {
    bars(rows.iter().map(|r| (r.category.clone(), r.orders, r.revenue)))
}

pub fn region_bars(rows: &[RegionBreakdown]) -> Vec<Bar> {
    bars(rows.iter().map(|r| (r.region.clone(), r.orders, r.revenue)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use salesdash_store::seed::seed;
    use salesdash_store::MemoryStore;

    #[tokio::test]
    async fn test_empty_store_gives_zero_stats_and_no_data_breakdowns() {
        let store = MemoryStore::new();
        let panels = load(&store, Duration::hours(24)).await;

        assert_eq!(panels.stats, Panel::Ok { data: StatsSnapshot::default() });
        assert!(matches!(panels.categories, Panel::NoData { .. }));
        assert!(matches!(panels.regions, Panel::NoData { .. }));
    }

    #[tokio::test]
    async fn test_store_outage_turns_every_panel_into_no_data() {
        let store = MemoryStore::new();
        store.set_offline(true);
        let panels = load(&store, Duration::hours(24)).await;

        assert!(matches!(panels.stats, Panel::NoData { .. }));
        let json = serde_json::to_value(&panels).unwrap();
        assert_eq!(json["stats"]["status"], "no_data");
        assert_eq!(json["categories"]["status"], "no_data");
        assert!(json["regions"]["reason"].as_str().unwrap().contains("offline"));
    }

    #[tokio::test]
    async fn test_loading_twice_without_writes_is_identical() {
        let store = MemoryStore::new();
        seed(&store, false).await.unwrap();

        let a = load(&store, Duration::hours(24)).await;
        let b = load(&store, Duration::hours(24)).await;
        assert_eq!(a, b);
        match a.stats {
            Panel::Ok { data } => assert_eq!(data.total_revenue, 4700.0),
            Panel::NoData { reason } => panic!("stats missing: {}", reason),
        }
    }

    #[test]
    fn test_bars_scale_to_largest_revenue() {
        let rows = vec![
            RegionBreakdown {
                region: "North".into(),
                orders: 1,
                revenue: 2400.0,
                avg_order_value: 2400.0,
            },
            RegionBreakdown {
                region: "South".into(),
                orders: 1,
                revenue: 800.0,
                avg_order_value: 800.0,
            },
        ];
        let bars = region_bars(&rows);
        assert_eq!(bars[0].width_pct, 100.0);
        assert_eq!(bars[1].width_pct, 33.3);
    }
}
