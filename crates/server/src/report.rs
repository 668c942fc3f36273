//! Batch analytics reports over the historical collection: revenue by
//! category, region, customer city and product, plus per-day activity.

use std::fmt::Write as _;

use clap::ValueEnum;
use serde::Serialize;

use salesdash_core::aggregate::{
    category_breakdown, city_breakdown, daily_counts, product_breakdown, region_breakdown,
};
use salesdash_core::{
    CategoryBreakdown, CityBreakdown, Collection, DailyCount, ProductBreakdown, RegionBreakdown,
};
use salesdash_store::{StoreError, TransactionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    Category,
    Region,
    City,
    Product,
    Daily,
    All,
}

impl ReportKind {
    fn includes(self, other: ReportKind) -> bool {
        self == ReportKind::All || self == other
    }
}

#[derive(Debug, Default, Serialize)]
pub struct Report {
    pub records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<CategoryBreakdown>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regions: Option<Vec<RegionBreakdown>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cities: Option<Vec<CityBreakdown>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<ProductBreakdown>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily: Option<Vec<DailyCount>>,
}

pub async fn build_report(store: &dyn TransactionStore, kind: ReportKind) -> Result<Report, StoreError> {
    let sales = store.fetch_all(Collection::Historical).await?;
    let mut report = Report {
        records: sales.len(),
        ..Report::default()
    };

    if kind.includes(ReportKind::Category) {
        report.categories = Some(category_breakdown(&sales));
    }
    if kind.includes(ReportKind::Region) {
        report.regions = Some(region_breakdown(&sales));
    }
    if kind.includes(ReportKind::City) {
        let customers = store.fetch_customers().await?;
        report.cities = Some(city_breakdown(&sales, &customers));
    }
    if kind.includes(ReportKind::Product) {
        report.products = Some(product_breakdown(&sales));
    }
    if kind.includes(ReportKind::Daily) {
        report.daily = Some(daily_counts(&sales));
    }
    Ok(report)
}

fn section(out: &mut String, title: &str, header: &str, lines: Vec<String>) {
    let _ = writeln!(out, "\n== {} ==", title);
    let _ = writeln!(out, "{}", header);
    if lines.is_empty() {
        let _ = writeln!(out, "  (no data)");
    }
    for line in lines {
        let _ = writeln!(out, "{}", line);
    }
}

/// Plain-text tables, one section per included breakdown.
pub fn render_table(report: &Report) -> String {
    let mut out = format!("Historical sales analysed: {}\n", report.records);

    if let Some(rows) = &report.categories {
        let lines = rows
            .iter()
            .map(|r| {
                format!(
                    "{:<14}{:>8}{:>10}{:>14.2}{:>12.2}",
                    r.category, r.orders, r.quantity, r.revenue, r.avg_price
                )
            })
            .collect();
        let header = format!("{:<14}{:>8}{:>10}{:>14}{:>12}", "category", "orders", "quantity", "revenue", "avg_price");
        section(&mut out, "Sales by category", &header, lines);
    }

    if let Some(rows) = &report.regions {
        let lines = rows
            .iter()
            .map(|r| format!("{:<14}{:>8}{:>14.2}{:>16.2}", r.region, r.orders, r.revenue, r.avg_order_value))
            .collect();
        let header = format!("{:<14}{:>8}{:>14}{:>16}", "region", "orders", "revenue", "avg_order_value");
        section(&mut out, "Sales by region", &header, lines);
    }

    if let Some(rows) = &report.cities {
        let lines = rows
            .iter()
            .map(|r| format!("{:<14}{:>8}{:>14.2}", r.city, r.orders, r.revenue))
            .collect();
        let header = format!("{:<14}{:>8}{:>14}", "city", "orders", "revenue");
        section(&mut out, "Sales by customer city", &header, lines);
    }

    if let Some(rows) = &report.products {
        let lines = rows
            .iter()
            .map(|r| format!("{:<14}{:>12}{:>14.2}", r.product, r.total_sold, r.revenue))
            .collect();
        let header = format!("{:<14}{:>12}{:>14}", "product", "total_sold", "revenue");
        section(&mut out, "Top products", &header, lines);
    }

    if let Some(rows) = &report.daily {
        let lines = rows
            .iter()
            .map(|r| {
                format!(
                    "{:<14}{:>14}{:>14.2}{:>16.2}",
                    r.date.to_string(),
                    r.transactions,
                    r.revenue,
                    r.avg_transaction
                )
            })
            .collect();
        let header = format!("{:<14}{:>14}{:>14}{:>16}", "date", "transactions", "revenue", "avg_transaction");
        section(&mut out, "Daily activity", &header, lines);
    }

    out
}
