use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use salesdash_core::{Collection, Customer, TransactionRecord};

use crate::backend::TransactionStore;
use crate::error::StoreError;

/// In-process store used when no PostgreSQL is configured, and in tests.
///
/// `set_offline(true)` makes every operation fail with
/// [`StoreError::Unavailable`], which is how outages are simulated.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Vec<TransactionRecord>>>,
    customers: RwLock<Vec<Customer>>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn is_persistent(&self) -> bool {
        false
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_online()
    }

    async fn insert(&self, collection: Collection, record: &TransactionRecord) -> Result<(), StoreError> {
        self.check_online()?;
        record.validate()?;
        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .push(record.clone());
        Ok(())
    }

    async fn count(&self, collection: Collection) -> Result<u64, StoreError> {
        self.check_online()?;
        let collections = self.collections.read().await;
        Ok(collections.get(&collection).map(|v| v.len() as u64).unwrap_or(0))
    }

    async fn fetch_all(&self, collection: Collection) -> Result<Vec<TransactionRecord>, StoreError> {
        self.check_online()?;
        let collections = self.collections.read().await;
        Ok(collections.get(&collection).cloned().unwrap_or_default())
    }

    async fn insert_customers(&self, customers: &[Customer]) -> Result<u64, StoreError> {
        self.check_online()?;
        let mut stored = self.customers.write().await;
        let mut added = 0;
        for customer in customers {
            if stored.iter().any(|c| c.id == customer.id) {
                continue;
            }
            stored.push(customer.clone());
            added += 1;
        }
        Ok(added)
    }

    async fn fetch_customers(&self) -> Result<Vec<Customer>, StoreError> {
        self.check_online()?;
        Ok(self.customers.read().await.clone())
    }
}
