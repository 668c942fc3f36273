//! The ingestion ticker: one synthetic sale appended to the realtime
//! collection per period.
//!
//! Inserts are best-effort. A failed insert drops the record, bumps
//! [`TickerMetrics::failed`], and the loop carries on with the next period.
//! The loop runs until the shutdown channel flips to `true`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use salesdash_core::{Collection, RecordId};
use salesdash_store::SharedStore;

use crate::generator::RecordGenerator;

// ── Metrics ──────────────────────────────────────────────────────────

/// Counters observable from outside the ticker task.
#[derive(Debug, Default)]
pub struct TickerMetrics {
    pub ticks: AtomicU64,
    pub inserted: AtomicU64,
    pub failed: AtomicU64,
    pub last_tick_epoch_ms: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TickerMetricsSnapshot {
    pub ticks: u64,
    pub inserted: u64,
    pub failed: u64,
    pub last_tick_epoch_ms: u64,
}

impl TickerMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn snapshot(&self) -> TickerMetricsSnapshot {
        TickerMetricsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            inserted: self.inserted.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            last_tick_epoch_ms: self.last_tick_epoch_ms.load(Ordering::Relaxed),
        }
    }
}

// ── Ticker ───────────────────────────────────────────────────────────

/// Result of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Inserted(RecordId),
    Dropped,
}

pub struct IngestionTicker {
    store: SharedStore,
    generator: RecordGenerator,
    metrics: Arc<TickerMetrics>,
    interval: Duration,
}

impl IngestionTicker {
    pub fn new(
        store: SharedStore,
        generator: RecordGenerator,
        metrics: Arc<TickerMetrics>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            generator,
            metrics,
            interval,
        }
    }

    pub fn metrics(&self) -> Arc<TickerMetrics> {
        self.metrics.clone()
    }

    /// Generate one record and try to persist it. Never fails.
    pub async fn tick(&mut self) -> TickOutcome {
        let now = Utc::now();
        let record = self.generator.generate(now);
        self.metrics.ticks.fetch_add(1, Ordering::Relaxed);
        self.metrics
            .last_tick_epoch_ms
            .store(now.timestamp_millis().max(0) as u64, Ordering::Relaxed);

        match self.store.insert(Collection::Realtime, &record).await {
            Ok(()) => {
                self.metrics.inserted.fetch_add(1, Ordering::Relaxed);
                debug!(
                    id = %record.id,
                    product = %record.product,
                    quantity = record.quantity,
                    price = record.price,
                    "ticker: inserted realtime sale"
                );
                TickOutcome::Inserted(record.id)
            }
            Err(e) => {
                self.metrics.failed.fetch_add(1, Ordering::Relaxed);
                debug!(error = %e, "ticker: insert failed, record dropped");
                TickOutcome::Dropped
            }
        }
    }

    /// Run the tick loop on a tokio task until `shutdown` becomes `true`
    /// (or its sender is dropped). The first tick fires one period after
    /// spawning; late ticks are delayed rather than bursted.
    pub fn spawn(mut self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                "ingestion ticker started (interval: {}s, backend: {})",
                self.interval.as_secs_f64(),
                self.store.backend_name()
            );

            let mut interval =
                tokio::time::interval_at(Instant::now() + self.interval, self.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                if *shutdown.borrow() {
                    break;
                }
                tokio::select! {
                    _ = interval.tick() => {
                        self.tick().await;
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            let m = self.metrics.snapshot();
            info!(
                ticks = m.ticks,
                inserted = m.inserted,
                failed = m.failed,
                "ingestion ticker stopped"
            );
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────────
