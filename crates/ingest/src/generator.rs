//! Synthetic transaction generation.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use salesdash_core::catalog::{
    customer_id, CATEGORIES, CUSTOMER_POOL, PRICE_RANGE, PRODUCTS, QUANTITY_RANGE, REGIONS,
};
use salesdash_core::{round_cents, TransactionRecord};

/// Produces simulated sales by sampling each field uniformly.
pub struct RecordGenerator<R = StdRng> {
    rng: R,
}

impl RecordGenerator<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Deterministic generator for tests and reproducible demos.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RecordGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// One record stamped with `now`.
    pub fn generate(&mut self, now: DateTime<Utc>) -> TransactionRecord {
        let (qty_lo, qty_hi) = QUANTITY_RANGE;
        let (price_lo, price_hi) = PRICE_RANGE;
        // Rounding can land a hair outside the bounds; clamp back in.
        let price = round_cents(self.rng.gen_range(price_lo..=price_hi)).clamp(price_lo, price_hi);

        TransactionRecord {
            id: Uuid::new_v4(),
            timestamp: now,
            product: self.pick(PRODUCTS).to_string(),
            category: self.pick(CATEGORIES).to_string(),
            quantity: self.rng.gen_range(qty_lo..=qty_hi),
            price,
            region: self.pick(REGIONS).to_string(),
            customer_id: customer_id(self.rng.gen_range(1..=CUSTOMER_POOL)),
        }
    }

    fn pick(&mut self, catalog: &[&'static str]) -> &'static str {
        catalog[self.rng.gen_range(0..catalog.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use salesdash_core::catalog::{is_category, is_product, is_region};

    #[test]
    fn test_generated_records_respect_catalogs_and_ranges() {
        let mut generator = RecordGenerator::seeded(7);
        let now = Utc::now();

        for _ in 0..5_000 {
            let r = generator.generate(now);
            assert!((1..=5).contains(&r.quantity), "quantity {}", r.quantity);
            assert!(r.price >= 25.0 && r.price <= 1200.0, "price {}", r.price);
            assert_eq!(r.price, round_cents(r.price));
            assert!(is_product(&r.product), "product {}", r.product);
            assert!(is_category(&r.category), "category {}", r.category);
            assert!(is_region(&r.region), "region {}", r.region);
            assert!(r.customer_id.starts_with('C') && r.customer_id.len() == 4);
            assert_eq!(r.timestamp, now);
            r.validate().unwrap();
        }
    }

    #[test]
    fn test_sampling_covers_every_catalog_entry() {
        let mut generator = RecordGenerator::seeded(11);
        let now = Utc::now();
        let mut products = HashSet::new();
        let mut categories = HashSet::new();
        let mut regions = HashSet::new();
        let mut quantities = HashSet::new();

        for _ in 0..2_000 {
            let r = generator.generate(now);
            products.insert(r.product);
            categories.insert(r.category);
            regions.insert(r.region);
            quantities.insert(r.quantity);
        }

        assert_eq!(products.len(), PRODUCTS.len());
        assert_eq!(categories.len(), CATEGORIES.len());
        assert_eq!(regions.len(), REGIONS.len());
        assert_eq!(quantities.len(), 5);
    }

    #[test]
    fn test_same_seed_same_fields() {
        let now = Utc::now();
        let a = RecordGenerator::seeded(3).generate(now);
        let b = RecordGenerator::seeded(3).generate(now);
        assert_eq!(
            (a.product, a.category, a.quantity, a.price, a.region, a.customer_id),
            (b.product, b.category, b.quantity, b.price, b.region, b.customer_id)
        );
    }
}
