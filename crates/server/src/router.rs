//! HTTP router construction.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::state::AppState;
use crate::{api, pages};

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(pages::landing))
        .route("/dashboard", get(pages::dashboard))
        .route("/health", get(api::health))
        .route("/api/stats", get(api::stats))
        .route("/api/dashboard", get(api::dashboard))
        .route("/api/status", get(api::status))
        .route("/api/hadoop_status", get(api::status))
        .route("/api/ingest", get(api::ingest_metrics))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use salesdash_core::config::DashboardConfig;
    use salesdash_ingest::{IngestionTicker, RecordGenerator, TickerMetrics};
    use salesdash_store::seed::seed;
    use salesdash_store::MemoryStore;

    use crate::probe::Prober;

    fn dashboard_config() -> DashboardConfig {
        DashboardConfig {
            refresh_secs: 5,
            realtime_window_hours: 24,
            spark_master_url: "http://spark:8080".into(),
            namenode_ui_url: "http://namenode:9870".into(),
            yarn_ui_url: "http://yarn:8088".into(),
        }
    }

    fn app(store: Arc<MemoryStore>, ticker: Option<Arc<TickerMetrics>>) -> Router {
        let prober = Prober::new(None, None, Duration::from_secs(1)).unwrap();
        build_router(Arc::new(AppState::new(store, dashboard_config(), prober, ticker)))
    }

    async fn get_raw(app: &Router, uri: &str) -> (StatusCode, String) {
        let resp = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
        let (status, body) = get_raw(app, uri).await;
        (status, serde_json::from_str(&body).unwrap())
    }

    fn without_timestamp(mut v: Value) -> Value {
        if let Some(obj) = v.as_object_mut() {
            obj.remove("timestamp");
        }
        v
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(Arc::new(MemoryStore::new()), None);
        let (status, body) = get_json(&app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert!(body["version"].is_string());
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_empty_store_stats_are_zero() {
        let app = app(Arc::new(MemoryStore::new()), None);
        let (status, body) = get_json(&app, "/api/stats").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            without_timestamp(body),
            serde_json::json!({
                "total_sales": 0,
                "total_revenue": 0.0,
                "realtime_sales": 0,
                "unique_customers": 0
            })
        );
    }

    #[tokio::test]
    async fn test_unreachable_store_degrades_to_200() {
        let store = Arc::new(MemoryStore::new());
        store.set_offline(true);
        let app = app(store, None);

        let (status, body) = get_json(&app, "/api/stats").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["error"].as_str().unwrap().contains("unavailable"));
        assert!(body.get("total_sales").is_none());

        let (status, body) = get_json(&app, "/api/dashboard").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stats"]["status"], "no_data");
        assert_eq!(body["categories"]["status"], "no_data");
        assert_eq!(body["regions"]["status"], "no_data");

        let (status, html) = get_raw(&app, "/dashboard").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("No data available"));

        let (status, html) = get_raw(&app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("No data available"));
    }

    #[tokio::test]
    async fn test_repeated_polls_without_writes_are_identical() {
        let store = Arc::new(MemoryStore::new());
        seed(store.as_ref(), false).await.unwrap();
        let app = app(store, None);

        let (_, a) = get_json(&app, "/api/stats").await;
        let (_, b) = get_json(&app, "/api/stats").await;
        assert_eq!(without_timestamp(a.clone()), without_timestamp(b));
        assert_eq!(a["total_sales"], 3);
        assert_eq!(a["total_revenue"], 4700.0);
        assert_eq!(a["unique_customers"], 3);
        assert_eq!(a["realtime_sales"], 0);

        let (_, a) = get_json(&app, "/api/dashboard").await;
        let (_, b) = get_json(&app, "/api/dashboard").await;
        assert_eq!(a["categories"], b["categories"]);
        assert_eq!(a["regions"], b["regions"]);
        assert_eq!(a["categories"]["data"][0]["category"], "Electronics");
    }

    #[tokio::test]
    async fn test_total_sales_never_decreases_while_ticking() {
        let store = Arc::new(MemoryStore::new());
        seed(store.as_ref(), false).await.unwrap();
        let mut ticker = IngestionTicker::new(
            store.clone(),
            RecordGenerator::seeded(5),
            TickerMetrics::new(),
            Duration::from_secs(10),
        );
        let app = app(store, Some(ticker.metrics()));

        let mut last = 0;
        for _ in 0..5 {
            ticker.tick().await;
            let (_, body) = get_json(&app, "/api/stats").await;
            let total = body["total_sales"].as_u64().unwrap();
            assert!(total >= last, "{} < {}", total, last);
            last = total;
        }
        assert_eq!(last, 8);

        let (_, body) = get_json(&app, "/api/stats").await;
        assert_eq!(body["realtime_sales"], 5);

        let (_, body) = get_json(&app, "/api/ingest").await;
        assert_eq!(body["enabled"], true);
        assert_eq!(body["inserted"], 5);
        assert_eq!(body["failed"], 0);
    }

    #[tokio::test]
    async fn test_ingest_when_ticker_disabled() {
        let app = app(Arc::new(MemoryStore::new()), None);
        let (_, body) = get_json(&app, "/api/ingest").await;
        assert_eq!(body, serde_json::json!({ "enabled": false }));
    }

    #[tokio::test]
    async fn test_status_and_alias_with_nothing_configured() {
        let app = app(Arc::new(MemoryStore::new()), None);
        for uri in ["/api/status", "/api/hadoop_status"] {
            let (status, body) = get_json(&app, uri).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["namenode"], "NOT_CONFIGURED");
            assert_eq!(body["resourcemanager"], "NOT_CONFIGURED");
            assert_eq!(body["store"], "NOT_CONFIGURED");
        }
    }

    #[tokio::test]
    async fn test_pages_render_current_snapshot() {
        let store = Arc::new(MemoryStore::new());
        seed(store.as_ref(), false).await.unwrap();
        let app = app(store, None);

        let (status, html) = get_raw(&app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("$4,700.00"));
        assert!(html.contains("http://namenode:9870"));
        assert!(html.contains("http://spark:8080"));
        assert!(html.contains("const REFRESH_MS = 5000;"));

        let (status, html) = get_raw(&app, "/dashboard").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Revenue by region"));
        assert!(html.contains("North"));
        assert!(html.contains("class=\"bar\" style=\"width: 100"));
    }

    #[tokio::test]
    async fn test_empty_store_dashboard_shows_placeholders() {
        let app = app(Arc::new(MemoryStore::new()), None);
        let (_, body) = get_json(&app, "/api/dashboard").await;
        assert_eq!(body["stats"]["status"], "ok");
        assert_eq!(body["categories"]["status"], "no_data");
        assert_eq!(body["refresh_secs"], 5);
        assert!(body["ticker"].is_null());
    }
}
