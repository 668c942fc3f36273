//! Infrastructure status probes.
//!
//! Each probe reports `UP`, `DOWN` or `NOT_CONFIGURED`. HTTP probes share one
//! `reqwest::Client` whose timeout bounds the whole request, so an endpoint
//! that accepts the connection and never answers still resolves to `DOWN`.

use std::time::Duration;

use chrono::Utc;
use reqwest::StatusCode;
use serde::Serialize;
use tracing::debug;

use salesdash_core::config::ProbeConfig;
use salesdash_store::TransactionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProbeStatus {
    Up,
    Down,
    NotConfigured,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub namenode: ProbeStatus,
    pub resourcemanager: ProbeStatus,
    pub store: ProbeStatus,
    pub timestamp: String,
}

pub struct Prober {
    client: reqwest::Client,
    namenode_url: Option<String>,
    resourcemanager_url: Option<String>,
    timeout: Duration,
}

impl Prober {
    pub fn new(
        namenode_url: Option<String>,
        resourcemanager_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            namenode_url,
            resourcemanager_url,
            timeout,
        })
    }

    pub fn from_config(config: &ProbeConfig) -> Result<Self, reqwest::Error> {
        Self::new(
            config.namenode_url.clone(),
            config.resourcemanager_url.clone(),
            config.timeout(),
        )
    }

    /// `UP` iff the endpoint answers 200 within the timeout.
    pub async fn probe_http(&self, url: Option<&str>) -> ProbeStatus {
        let Some(url) = url else {
            return ProbeStatus::NotConfigured;
        };
        match self.client.get(url).send().await {
            Ok(resp) if resp.status() == StatusCode::OK => ProbeStatus::Up,
            Ok(resp) => {
                debug!(url, status = %resp.status(), "probe: non-200 response");
                ProbeStatus::Down
            }
            Err(e) => {
                debug!(url, error = %e, timeout = e.is_timeout(), "probe: request failed");
                ProbeStatus::Down
            }
        }
    }

    /// The in-memory fallback has nothing external to reach and reports
    /// `NOT_CONFIGURED`.
    pub async fn probe_store(&self, store: &dyn TransactionStore) -> ProbeStatus {
        if !store.is_persistent() {
            return ProbeStatus::NotConfigured;
        }
        match tokio::time::timeout(self.timeout, store.ping()).await {
            Ok(Ok(())) => ProbeStatus::Up,
            Ok(Err(e)) => {
                debug!(backend = store.backend_name(), error = %e, "probe: store ping failed");
                ProbeStatus::Down
            }
            Err(_) => {
                debug!(backend = store.backend_name(), "probe: store ping timed out");
                ProbeStatus::Down
            }
        }
    }

    /// Run every probe concurrently.
    pub async fn check_all(&self, store: &dyn TransactionStore) -> StatusReport {
        let (namenode, resourcemanager, store) = tokio::join!(
            self.probe_http(self.namenode_url.as_deref()),
            self.probe_http(self.resourcemanager_url.as_deref()),
            self.probe_store(store),
        );
        StatusReport {
            namenode,
            resourcemanager,
            store,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    use async_trait::async_trait;
    use axum::http::StatusCode as HttpStatus;
    use axum::routing::get;
    use axum::Router;
    use salesdash_core::{Collection, Customer, TransactionRecord};
    use salesdash_store::{MemoryStore, StoreError};
    use tokio::net::TcpListener;

    async fn serve_status(code: HttpStatus) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route("/jmx", get(move || async move { code }));
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        format!("http://{}/jmx", addr)
    }

    /// Accepts connections and never writes a byte back.
    async fn serve_silence() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("http://{}/jmx", addr)
    }

    /// A persistent store whose ping never completes.
    struct HangingStore;

    #[async_trait]
    impl TransactionStore for HangingStore {
        fn backend_name(&self) -> &'static str {
            "hanging"
        }
        fn is_persistent(&self) -> bool {
            true
        }
        async fn ping(&self) -> Result<(), StoreError> {
            std::future::pending::<()>().await;
            Ok(())
        }
        async fn insert(&self, _: Collection, _: &TransactionRecord) -> Result<(), StoreError> {
            Ok(())
        }
        async fn count(&self, _: Collection) -> Result<u64, StoreError> {
            Ok(0)
        }
        async fn fetch_all(&self, _: Collection) -> Result<Vec<TransactionRecord>, StoreError> {
            Ok(Vec::new())
        }
        async fn insert_customers(&self, _: &[Customer]) -> Result<u64, StoreError> {
            Ok(0)
        }
        async fn fetch_customers(&self) -> Result<Vec<Customer>, StoreError> {
            Ok(Vec::new())
        }
    }

    fn prober(namenode: Option<String>, rm: Option<String>) -> Prober {
        Prober::new(namenode, rm, Duration::from_millis(300)).unwrap()
    }

    #[tokio::test]
    async fn test_200_is_up_anything_else_is_down() {
        let ok = serve_status(HttpStatus::OK).await;
        let unavailable = serve_status(HttpStatus::SERVICE_UNAVAILABLE).await;
        let p = prober(None, None);

        assert_eq!(p.probe_http(Some(&ok)).await, ProbeStatus::Up);
        assert_eq!(p.probe_http(Some(&unavailable)).await, ProbeStatus::Down);
    }

    #[tokio::test]
    async fn test_unanswered_request_is_down_within_timeout() {
        let silent = serve_silence().await;
        let p = prober(Some(silent), None);

        let start = Instant::now();
        let report = p.check_all(&MemoryStore::new()).await;
        assert_eq!(report.namenode, ProbeStatus::Down);
        assert!(start.elapsed() < Duration::from_secs(2), "took {:?}", start.elapsed());
    }

    #[tokio::test]
    async fn test_refused_connection_is_down() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let p = prober(None, None);
        let status = p.probe_http(Some(&format!("http://{}/", addr))).await;
        assert_eq!(status, ProbeStatus::Down);
    }

    #[tokio::test]
    async fn test_unset_urls_and_memory_store_are_not_configured() {
        let report = prober(None, None).check_all(&MemoryStore::new()).await;
        assert_eq!(report.namenode, ProbeStatus::NotConfigured);
        assert_eq!(report.resourcemanager, ProbeStatus::NotConfigured);
        assert_eq!(report.store, ProbeStatus::NotConfigured);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["namenode"], "NOT_CONFIGURED");
        assert!(json["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_hanging_store_ping_is_down() {
        let start = Instant::now();
        let status = prober(None, None).probe_store(&HangingStore).await;
        assert_eq!(status, ProbeStatus::Down);
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_probes_run_concurrently() {
        let a = serve_silence().await;
        let b = serve_silence().await;
        let p = prober(Some(a), Some(b));

        let start = Instant::now();
        let report = p.check_all(&HangingStore).await;
        assert_eq!(
            (report.namenode, report.resourcemanager, report.store),
            (ProbeStatus::Down, ProbeStatus::Down, ProbeStatus::Down)
        );
        // Three sequential 300ms timeouts would take at least 900ms.
        assert!(start.elapsed() < Duration::from_millis(850), "took {:?}", start.elapsed());
    }
}
