use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use salesdash_core::aggregate::{self, CategoryBreakdown, RegionBreakdown, StatsSnapshot};
use salesdash_core::{Collection, Customer, TransactionRecord};

use crate::error::StoreError;

/// The shared document store holding both transaction collections and the
/// customer profiles.
///
/// Writes are single-record appends; reads tolerate staleness. The aggregate
/// methods have scan-based defaults over [`fetch_all`](Self::fetch_all);
/// backends that can push the work down to the database override them.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Short backend label for logs and status output.
    fn backend_name(&self) -> &'static str;

    /// Whether this backend is an external, persistent store. The in-memory
    /// fallback is not, and reports as not configured in status probes.
    fn is_persistent(&self) -> bool;

    /// Cheap connectivity check.
    async fn ping(&self) -> Result<(), StoreError>;

    async fn insert(&self, collection: Collection, record: &TransactionRecord) -> Result<(), StoreError>;

    async fn insert_many(
        &self,
        collection: Collection,
        records: &[TransactionRecord],
    ) -> Result<u64, StoreError> {
        for record in records {
            self.insert(collection, record).await?;
        }
        Ok(records.len() as u64)
    }

    async fn count(&self, collection: Collection) -> Result<u64, StoreError>;

    async fn fetch_all(&self, collection: Collection) -> Result<Vec<TransactionRecord>, StoreError>;

    /// Insert customers, skipping ids that already exist. Returns how many were new.
    async fn insert_customers(&self, customers: &[Customer]) -> Result<u64, StoreError>;

    async fn fetch_customers(&self) -> Result<Vec<Customer>, StoreError>;

    async fn stats(&self, now: DateTime<Utc>, window: Duration) -> Result<StatsSnapshot, StoreError> {
        let historical = self.fetch_all(Collection::Historical).await?;
        let realtime = self.fetch_all(Collection::Realtime).await?;
        Ok(aggregate::stats_snapshot(&historical, &realtime, now, window))
    }

    async fn category_breakdown(&self) -> Result<Vec<CategoryBreakdown>, StoreError> {
        let all = self.fetch_every_sale().await?;
        Ok(aggregate::category_breakdown(&all))
    }

    async fn region_breakdown(&self) -> Result<Vec<RegionBreakdown>, StoreError> {
        let all = self.fetch_every_sale().await?;
        Ok(aggregate::region_breakdown(&all))
    }

    /// Both collections, historical first.
    async fn fetch_every_sale(&self) -> Result<Vec<TransactionRecord>, StoreError> {
        let mut all = self.fetch_all(Collection::Historical).await?;
        all.extend(self.fetch_all(Collection::Realtime).await?);
        Ok(all)
    }
}
