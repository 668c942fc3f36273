//! Initial historical data for a fresh store.

use chrono::{NaiveDate, TimeZone, Utc};
use tracing::info;
use uuid::Uuid;

use salesdash_core::{Collection, Customer, TransactionRecord};

use crate::backend::TransactionStore;
use crate::error::StoreError;

/// What a seed run inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedOutcome {
    pub sales: u64,
    pub customers: u64,
    /// True when sales were skipped because the collection already had data.
    pub skipped_sales: bool,
}

fn sale(
    date: (i32, u32, u32),
    product: &str,
    quantity: u32,
    price: f64,
    customer: &str,
    region: &str,
) -> TransactionRecord {
    let (y, m, d) = date;
    let timestamp = NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .unwrap_or_else(Utc::now);
    TransactionRecord {
        id: Uuid::new_v4(),
        timestamp,
        product: product.to_string(),
        category: "Electronics".to_string(),
        quantity,
        price,
        region: region.to_string(),
        customer_id: customer.to_string(),
    }
}

pub fn seed_sales() -> Vec<TransactionRecord> {
    vec![
        sale((2024, 1, 15), "Laptop", 2, 1200.0, "C001", "North"),
        sale((2024, 1, 16), "Phone", 1, 800.0, "C002", "South"),
        sale((2024, 1, 17), "Tablet", 3, 500.0, "C003", "East"),
    ]
}

pub fn seed_customers() -> Vec<Customer> {
    let customer = |id: &str, name: &str, email: &str, age: u32, city: &str| Customer {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        age,
        city: city.to_string(),
    };
    vec![
        customer("C001", "Alice Johnson", "alice@example.com", 28, "New York"),
        customer("C002", "Bob Smith", "bob@example.com", 34, "Miami"),
        customer("C003", "Carol Davis", "carol@example.com", 29, "Boston"),
    ]
}

/// Insert the seed sales and customers.
///
/// Sales are only inserted into an empty historical collection unless
/// `force` is set; customers are always upserted by id.
pub async fn seed(store: &dyn TransactionStore, force: bool) -> Result<SeedOutcome, StoreError> {
    let mut outcome = SeedOutcome::default();

    let existing = store.count(Collection::Historical).await?;
    if existing > 0 && !force {
        info!(existing, "historical sales already present — skipping sales seed");
        outcome.skipped_sales = true;
    } else {
        outcome.sales = store.insert_many(Collection::Historical, &seed_sales()).await?;
    }

    outcome.customers = store.insert_customers(&seed_customers()).await?;
    info!(
        sales = outcome.sales,
        customers = outcome.customers,
        backend = store.backend_name(),
        "seed complete"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    #[test]
    fn test_seed_data_is_valid() {
        for record in seed_sales() {
            record.validate().unwrap();
        }
        let total: f64 = seed_sales().iter().map(|r| r.total_value()).sum();
        assert_eq!(total, 4700.0);
    }

    #[tokio::test]
    async fn test_seed_is_skipped_when_sales_exist() {
        let store = MemoryStore::new();

        let first = seed(&store, false).await.unwrap();
        assert_eq!(first.sales, 3);
        assert_eq!(first.customers, 3);
        assert!(!first.skipped_sales);

        let second = seed(&store, false).await.unwrap();
        assert!(second.skipped_sales);
        assert_eq!(second.sales, 0);
        assert_eq!(second.customers, 0);
        assert_eq!(store.count(Collection::Historical).await.unwrap(), 3);

        let forced = seed(&store, true).await.unwrap();
        assert_eq!(forced.sales, 3);
        assert_eq!(store.count(Collection::Historical).await.unwrap(), 6);
    }
}
