//! Aggregate snapshots recomputed from the full record set.
//!
//! Everything here is a pure function of its inputs: the same records always
//! produce the same snapshot, with rows ordered by revenue (descending) and
//! then by name so ties are stable.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::record::{round_cents, Customer, TransactionRecord};

// ── Headline stats ────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Records across both collections.
    pub total_sales: u64,
    /// Sum of quantity × price across both collections.
    pub total_revenue: f64,
    /// Realtime records inside the trailing window.
    pub realtime_sales: u64,
    pub unique_customers: u64,
}

/// Start of the trailing window ending at `now`. A window reaching past the
/// earliest representable instant starts there instead.
pub fn window_start(now: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    now.checked_sub_signed(window).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Compute the headline stats. `window` is the trailing span counted as
/// realtime activity, measured back from `now`.
pub fn stats_snapshot(
    historical: &[TransactionRecord],
    realtime: &[TransactionRecord],
    now: DateTime<Utc>,
    window: Duration,
) -> StatsSnapshot {
    let cutoff = window_start(now, window);
    let all = historical.iter().chain(realtime.iter());

    let mut revenue = 0.0;
    let mut customers: HashSet<&str> = HashSet::new();
    let mut total = 0u64;
    for r in all {
        total += 1;
        revenue += r.total_value();
        customers.insert(r.customer_id.as_str());
    }

    StatsSnapshot {
        total_sales: total,
        total_revenue: round_cents(revenue),
        realtime_sales: realtime.iter().filter(|r| r.timestamp >= cutoff).count() as u64,
        unique_customers: customers.len() as u64,
    }
}

// ── Group-bys ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub category: String,
    pub orders: u64,
    pub quantity: u64,
    pub revenue: f64,
    pub avg_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionBreakdown {
    pub region: String,
    pub orders: u64,
    pub revenue: f64,
    pub avg_order_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityBreakdown {
    pub city: String,
    pub orders: u64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductBreakdown {
    pub product: String,
    pub total_sold: u64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub transactions: u64,
    pub revenue: f64,
    pub avg_transaction: f64,
}

#[derive(Default)]
struct Acc {
    orders: u64,
    quantity: u64,
    revenue: f64,
    price_sum: f64,
}

impl Acc {
    fn add(&mut self, r: &TransactionRecord) {
        self.orders += 1;
        self.quantity += r.quantity as u64;
        self.revenue += r.total_value();
        self.price_sum += r.price;
    }
}

fn group_by<'a, F>(
    records: impl Iterator<Item = &'a TransactionRecord>,
    key: F,
) -> BTreeMap<String, Acc>
where
    F: Fn(&TransactionRecord) -> &str,
{
    let mut groups: BTreeMap<String, Acc> = BTreeMap::new();
    for r in records {
        groups.entry(key(r).to_string()).or_default().add(r);
    }
    groups
}

pub fn category_breakdown<'a>(
    records: impl IntoIterator<Item = &'a TransactionRecord>,
) -> Vec<CategoryBreakdown> {
    let mut rows: Vec<CategoryBreakdown> = group_by(records.into_iter(), |r| r.category.as_str())
        .into_iter()
        .map(|(category, acc)| CategoryBreakdown {
            category,
            orders: acc.orders,
            quantity: acc.quantity,
            revenue: round_cents(acc.revenue),
            avg_price: round_cents(acc.price_sum / acc.orders as f64),
        })
        .collect();
    rows.sort_by(|a, b| b.revenue.total_cmp(&a.revenue).then_with(|| a.category.cmp(&b.category)));
    rows
}

pub fn region_breakdown<'a>(
    records: impl IntoIterator<Item = &'a TransactionRecord>,
) -> Vec<RegionBreakdown> {
    let mut rows: Vec<RegionBreakdown> = group_by(records.into_iter(), |r| r.region.as_str())
        .into_iter()
        .map(|(region, acc)| RegionBreakdown {
            region,
            orders: acc.orders,
            revenue: round_cents(acc.revenue),
            avg_order_value: round_cents(acc.revenue / acc.orders as f64),
        })
        .collect();
    rows.sort_by(|a, b| b.revenue.total_cmp(&a.revenue).then_with(|| a.region.cmp(&b.region)));
    rows
}

/// Units sold and revenue per product, best sellers by revenue first.
pub fn product_breakdown<'a>(
    records: impl IntoIterator<Item = &'a TransactionRecord>,
) -> Vec<ProductBreakdown> {
    let mut rows: Vec<ProductBreakdown> = group_by(records.into_iter(), |r| r.product.as_str())
        .into_iter()
        .map(|(product, acc)| ProductBreakdown {
            product,
            total_sold: acc.quantity,
            revenue: round_cents(acc.revenue),
        })
        .collect();
    rows.sort_by(|a, b| b.revenue.total_cmp(&a.revenue).then_with(|| a.product.cmp(&b.product)));
    rows
}

/// Transactions per UTC calendar day, oldest day first.
pub fn daily_counts<'a>(records: impl IntoIterator<Item = &'a TransactionRecord>) -> Vec<DailyCount> {
    let mut days: BTreeMap<NaiveDate, Acc> = BTreeMap::new();
    for r in records {
        days.entry(r.timestamp.date_naive()).or_default().add(r);
    }
    days.into_iter()
        .map(|(date, acc)| DailyCount {
            date,
            transactions: acc.orders,
            revenue: round_cents(acc.revenue),
            avg_transaction: round_cents(acc.revenue / acc.orders as f64),
        })
        .collect()
}

/// Inner join of sales with customers on `customer_id`, grouped by city.
/// Sales whose customer is unknown are dropped.
pub fn city_breakdown<'a>(
    records: impl IntoIterator<Item = &'a TransactionRecord>,
    customers: &[Customer],
) -> Vec<CityBreakdown> {
    let city_of: HashMap<&str, &str> = customers
        .iter()
        .map(|c| (c.id.as_str(), c.city.as_str()))
        .collect();

    let mut groups: BTreeMap<&str, (u64, f64)> = BTreeMap::new();
    for r in records {
        if let Some(&city) = city_of.get(r.customer_id.as_str()) {
            let entry = groups.entry(city).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += r.total_value();
        }
    }

    let mut rows: Vec<CityBreakdown> = groups
        .into_iter()
        .map(|(city, (orders, revenue))| CityBreakdown {
            city: city.to_string(),
            orders,
            revenue: round_cents(revenue),
        })
        .collect();
    rows.sort_by(|a, b| b.revenue.total_cmp(&a.revenue).then_with(|| a.city.cmp(&b.city)));
    rows
}

// ── Tests ─────────────────────────────────────────────────────────
