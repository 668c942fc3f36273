use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Unique record identifier.
pub type RecordId = Uuid;

/// One sale. Written once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: RecordId,
    pub timestamp: DateTime<Utc>,
    pub product: String,
    pub category: String,
    pub quantity: u32,
    pub price: f64,
    pub region: String,
    pub customer_id: String,
}

impl TransactionRecord {
    pub fn total_value(&self) -> f64 {
        self.quantity as f64 * self.price
    }

    /// Reject records that would corrupt the aggregates.
    pub fn validate(&self) -> Result<(), CoreError> {
        let reason = if self.quantity == 0 {
            Some("quantity must be at least 1".to_string())
        } else if !(self.price.is_finite() && self.price > 0.0) {
            Some(format!("price must be positive, got {}", self.price))
        } else if self.customer_id.is_empty() {
            Some("customer_id is empty".to_string())
        } else {
            None
        };

        match reason {
            Some(reason) => Err(CoreError::InvalidRecord {
                id: self.id.to_string(),
                reason,
            }),
            None => Ok(()),
        }
    }
}

/// Customer profile, joined against sales for the city report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: String,
    pub age: u32,
    pub city: String,
}

/// The two logical transaction collections in the shared store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// Seeded and batch-loaded sales.
    Historical,
    /// Written only by the ingestion ticker.
    Realtime,
}

impl Collection {
    pub fn table_name(&self) -> &'static str {
        match self {
            Collection::Historical => "sales",
            Collection::Realtime => "realtime_sales",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Round a monetary amount to cents.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(quantity: u32, price: f64) -> TransactionRecord {
        TransactionRecord {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            product: "Laptop".to_string(),
            category: "Electronics".to_string(),
            quantity,
            price,
            region: "North".to_string(),
            customer_id: "C001".to_string(),
        }
    }

    #[test]
    fn test_total_value() {
        assert_eq!(record(3, 500.0).total_value(), 1500.0);
    }

    #[test]
    fn test_validate_rejects_zero_quantity() {
        let err = record(0, 10.0).validate().unwrap_err();
        assert!(err.to_string().contains("quantity"));
    }

    #[test]
    fn test_validate_rejects_non_positive_price() {
        assert!(record(1, 0.0).validate().is_err());
        assert!(record(1, -3.5).validate().is_err());
        assert!(record(1, f64::NAN).validate().is_err());
        assert!(record(1, 0.01).validate().is_ok());
    }

    #[test]
    fn test_collection_table_names() {
        assert_eq!(Collection::Historical.to_string(), "sales");
        assert_eq!(Collection::Realtime.table_name(), "realtime_sales");
    }

    #[test]
    fn test_record_json_shape() {
        let r = record(2, 19.99);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["quantity"], 2);
        assert_eq!(json["customer_id"], "C001");
        assert_eq!(serde_json::to_value(Collection::Realtime).unwrap(), "realtime");

        let back: TransactionRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn test_round_cents() {
        assert_eq!(round_cents(12.346), 12.35);
        assert_eq!(round_cents(7.0), 7.0);
        assert_eq!(round_cents(0.0), 0.0);
    }
}
