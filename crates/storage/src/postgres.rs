//! PostgreSQL backend for the shared store.
//!
//! Tables are created by the workspace `migrations/` directory. Migrations are
//! retried before each operation until one run succeeds, so a database that
//! was down at startup is usable once it comes back. The aggregate
//! methods run as SQL over the union of `sales` and `realtime_sales`; row
//! ordering and cent rounding are applied afterwards so results match the
//! scan-based defaults exactly.

use std::future::Future;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::sync::OnceCell;
use tracing::{info, warn};
use uuid::Uuid;

use salesdash_core::config::PostgresConfig;
use salesdash_core::aggregate::window_start;
use salesdash_core::{
    round_cents, CategoryBreakdown, Collection, Customer, RegionBreakdown, StatsSnapshot,
    TransactionRecord,
};

use crate::backend::TransactionStore;
use crate::error::StoreError;

const ALL_SALES: &str = "SELECT quantity, price, customer_id, category, region FROM sales
     UNION ALL
     SELECT quantity, price, customer_id, category, region FROM realtime_sales";

fn insert_sql(collection: Collection) -> String {
    format!(
        "INSERT INTO {} (id, ts, product, category, quantity, price, region, customer_id)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        collection.table_name()
    )
}

#[derive(sqlx::FromRow)]
struct SaleRow {
    id: Uuid,
    ts: DateTime<Utc>,
    product: String,
    category: String,
    quantity: i32,
    price: f64,
    region: String,
    customer_id: String,
}

impl SaleRow {
    fn into_record(self, table: &'static str) -> Result<TransactionRecord, StoreError> {
        let quantity = u32::try_from(self.quantity).map_err(|_| StoreError::CorruptRow {
            table,
            reason: format!("negative quantity {} for {}", self.quantity, self.id),
        })?;
        Ok(TransactionRecord {
            id: self.id,
            timestamp: self.ts,
            product: self.product,
            category: self.category,
            quantity,
            price: self.price,
            region: self.region,
            customer_id: self.customer_id,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: String,
    name: String,
    email: String,
    age: i32,
    city: String,
}

/// Records whether migrations have completed. A failed attempt leaves the
/// gate open, so the next caller runs the migration again; concurrent callers
/// wait on a single in-flight attempt.
#[derive(Debug, Default)]
pub(crate) struct MigrationGate {
    done: OnceCell<()>,
}

impl MigrationGate {
    pub(crate) async fn ensure<F, Fut>(&self, migrate: F) -> Result<(), StoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), StoreError>>,
    {
        self.done.get_or_try_init(migrate).await.map(|_| ())
    }

    pub(crate) fn is_done(&self) -> bool {
        self.done.initialized()
    }
}

pub struct PgStore {
    pool: PgPool,
    migrations: MigrationGate,
}

impl PgStore {
    /// Build a lazily-connecting pool. No connection is made until first use,
    /// so an unreachable database degrades requests instead of blocking startup.
    pub fn connect_lazy(config: &PostgresConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout())
            .connect_lazy(&config.database_url())?;
        info!("PostgreSQL store configured: {}:{}/{}", config.host, config.port, config.database);
        Ok(Self {
            pool,
            migrations: MigrationGate::default(),
        })
    }

    /// Apply pending migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        info!("Database migrations applied successfully");
        Ok(())
    }

    /// Run migrations unless a previous run already succeeded.
    async fn ready(&self) -> Result<(), StoreError> {
        self.migrations.ensure(|| self.migrate()).await
    }

    pub fn migrations_applied(&self) -> bool {
        self.migrations.is_done()
    }

    /// Migrate, logging instead of failing. Used at server startup; later
    /// operations retry until migrations go through.
    pub async fn migrate_or_warn(&self) {
        if let Err(e) = self.ready().await {
            warn!("Failed to run migrations: {}. Retrying on next store access", e);
        }
    }
}

#[async_trait]
impl TransactionStore for PgStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    fn is_persistent(&self) -> bool {
        true
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.ready().await?;
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert(&self, collection: Collection, record: &TransactionRecord) -> Result<(), StoreError> {
        record.validate()?;
        self.ready().await?;
        let sql = insert_sql(collection);
        sqlx::query(&sql)
            .bind(record.id)
            .bind(record.timestamp)
            .bind(&record.product)
            .bind(&record.category)
            .bind(record.quantity as i32)
            .bind(record.price)
            .bind(&record.region)
            .bind(&record.customer_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_many(
        &self,
        collection: Collection,
        records: &[TransactionRecord],
    ) -> Result<u64, StoreError> {
        self.ready().await?;
        let mut tx = self.pool.begin().await?;
        let sql = insert_sql(collection);
        for record in records {
            record.validate()?;
            sqlx::query(&sql)
                .bind(record.id)
                .bind(record.timestamp)
                .bind(&record.product)
                .bind(&record.category)
                .bind(record.quantity as i32)
                .bind(record.price)
                .bind(&record.region)
                .bind(&record.customer_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(records.len() as u64)
    }

    async fn count(&self, collection: Collection) -> Result<u64, StoreError> {
        self.ready().await?;
        let sql = format!("SELECT COUNT(*) FROM {}", collection.table_name());
        let n: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(n.max(0) as u64)
    }

    async fn fetch_all(&self, collection: Collection) -> Result<Vec<TransactionRecord>, StoreError> {
        self.ready().await?;
        let table = collection.table_name();
        let sql = format!(
            "SELECT id, ts, product, category, quantity, price, region, customer_id
             FROM {} ORDER BY ts, id",
            table
        );
        let rows = sqlx::query_as::<_, SaleRow>(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(|r| r.into_record(table)).collect()
    }

    async fn insert_customers(&self, customers: &[Customer]) -> Result<u64, StoreError> {
        self.ready().await?;
        let mut added = 0;
        for c in customers {
            let result = sqlx::query(
                "INSERT INTO customers (id, name, email, age, city)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (id) DO NOTHING",
            )
            .bind(&c.id)
            .bind(&c.name)
            .bind(&c.email)
            .bind(c.age as i32)
            .bind(&c.city)
            .execute(&self.pool)
            .await?;
            added += result.rows_affected();
        }
        Ok(added)
    }

    async fn fetch_customers(&self) -> Result<Vec<Customer>, StoreError> {
        self.ready().await?;
        let rows = sqlx::query_as::<_, CustomerRow>(
            "SELECT id, name, email, age, city FROM customers ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| Customer {
                id: r.id,
                name: r.name,
                email: r.email,
                age: r.age.max(0) as u32,
                city: r.city,
            })
            .collect())
    }

    async fn stats(&self, now: DateTime<Utc>, window: Duration) -> Result<StatsSnapshot, StoreError> {
        self.ready().await?;
        let sql = format!(
            "SELECT COUNT(*)::BIGINT,
                    COALESCE(SUM(quantity * price), 0)::DOUBLE PRECISION,
                    COUNT(DISTINCT customer_id)::BIGINT
             FROM ({}) AS t",
            ALL_SALES
        );
        let (total, revenue, customers): (i64, f64, i64) =
            sqlx::query_as(&sql).fetch_one(&self.pool).await?;

        // timestamptz cannot hold chrono's earliest instant.
        let cutoff = window_start(now, window).max(DateTime::<Utc>::UNIX_EPOCH);
        let realtime: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM realtime_sales WHERE ts >= $1")
            .bind(cutoff)
            .fetch_one(&self.pool)
            .await?;

        Ok(StatsSnapshot {
            total_sales: total.max(0) as u64,
            total_revenue: round_cents(revenue),
            realtime_sales: realtime.max(0) as u64,
            unique_customers: customers.max(0) as u64,
        })
    }

    async fn category_breakdown(&self) -> Result<Vec<CategoryBreakdown>, StoreError> {
        self.ready().await?;
        let sql = format!(
            "SELECT category,
                    COUNT(*)::BIGINT,
                    SUM(quantity)::BIGINT,
                    SUM(quantity * price)::DOUBLE PRECISION,
                    AVG(price)::DOUBLE PRECISION
             FROM ({}) AS t
             GROUP BY category",
            ALL_SALES
        );
        let rows: Vec<(String, i64, i64, f64, f64)> =
            sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        let mut out: Vec<CategoryBreakdown> = rows
            .into_iter()
            .map(|(category, orders, quantity, revenue, avg_price)| CategoryBreakdown {
                category,
                orders: orders.max(0) as u64,
                quantity: quantity.max(0) as u64,
                revenue: round_cents(revenue),
                avg_price: round_cents(avg_price),
            })
            .collect();
        out.sort_by(|a, b| b.revenue.total_cmp(&a.revenue).then_with(|| a.category.cmp(&b.category)));
        Ok(out)
    }

    async fn region_breakdown(&self) -> Result<Vec<RegionBreakdown>, StoreError> {
        self.ready().await?;
        let sql = format!(
            "SELECT region,
                    COUNT(*)::BIGINT,
                    SUM(quantity * price)::DOUBLE PRECISION
             FROM ({}) AS t
             GROUP BY region",
            ALL_SALES
        );
        let rows: Vec<(String, i64, f64)> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        let mut out: Vec<RegionBreakdown> = rows
            .into_iter()
            .map(|(region, orders, revenue)| {
                let orders = orders.max(1) as u64;
                RegionBreakdown {
                    region,
                    orders,
                    revenue: round_cents(revenue),
                    avg_order_value: round_cents(revenue / orders as f64),
                }
            })
            .collect();
        out.sort_by(|a, b| b.revenue.total_cmp(&a.revenue).then_with(|| a.region.cmp(&b.region)));
        Ok(out)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
