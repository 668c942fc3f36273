use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Ok(v) = env::var(&prefixed) {
            return Some(v);
        }
    }
    env::var(key).ok()
}

/// Like [`profiled_env_opt`] but treats an empty value as unset.
fn profiled_env_nonempty(profile: &str, key: &str) -> Option<String> {
    profiled_env_opt(profile, key).filter(|s| !s.is_empty())
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_nonempty(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_parse<T: std::str::FromStr>(profile: &str, key: &str, default: T) -> T {
    profiled_env_nonempty(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_nonempty(profile, key).map(|v| v.to_ascii_lowercase()) {
        Some(v) if v == "true" || v == "1" || v == "yes" => true,
        Some(v) if v == "false" || v == "0" || v == "no" => false,
        _ => default,
    }
}

/// A probe URL: unset means the built-in default, set-but-empty disables it.
fn profiled_probe_url(profile: &str, key: &str, default: &str) -> Option<String> {
    match profiled_env_opt(profile, key) {
        Some(v) if v.trim().is_empty() => None,
        Some(v) => Some(v),
        None => Some(default.to_string()),
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub postgres: PostgresConfig,
    pub ticker: TickerConfig,
    pub dashboard: DashboardConfig,
    pub probes: ProbeConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `SALESDASH_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("SALESDASH_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            postgres: PostgresConfig::from_env_profiled(p),
            ticker: TickerConfig::from_env_profiled(p),
            dashboard: DashboardConfig::from_env_profiled(p),
            probes: ProbeConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:     {}:{}", self.server.host, self.server.port);
        if self.postgres.is_configured() {
            tracing::info!("  postgres:   host={}, db={}", self.postgres.host, self.postgres.database);
        } else {
            tracing::info!("  postgres:   not configured (in-memory store)");
        }
        tracing::info!(
            "  ticker:     enabled={}, interval={}s",
            self.ticker.enabled,
            self.ticker.interval_secs
        );
        tracing::info!(
            "  dashboard:  refresh={}s, realtime_window={}h",
            self.dashboard.refresh_secs,
            self.dashboard.realtime_window_hours
        );
        tracing::info!(
            "  probes:     namenode={}, resourcemanager={}, timeout={}s",
            self.probes.namenode_url.as_deref().unwrap_or("(disabled)"),
            self.probes.resourcemanager_url.as_deref().unwrap_or("(disabled)"),
            self.probes.timeout_secs
        );
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_parse(p, "PORT", 5000),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ── PostgreSQL (shared store) ─────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    /// Full connection URL; takes precedence over the individual fields.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

impl PostgresConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            url: profiled_env_nonempty(p, "PG_URL"),
            host: profiled_env_or(p, "PG_HOST", "localhost"),
            port: profiled_env_parse(p, "PG_PORT", 5432),
            database: profiled_env_or(p, "PG_DATABASE", "bigdata"),
            username: profiled_env_nonempty(p, "PG_USERNAME"),
            password: profiled_env_nonempty(p, "PG_PASSWORD"),
            max_connections: profiled_env_parse(p, "PG_MAX_CONNECTIONS", 5),
            connect_timeout_secs: profiled_env_parse(p, "PG_CONNECT_TIMEOUT_SECS", 3),
        }
    }

    /// The shared store is PostgreSQL only when a URL or a username is given.
    pub fn is_configured(&self) -> bool {
        self.url.is_some() || self.username.is_some()
    }

    pub fn database_url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        let user = self.username.as_deref().unwrap_or("postgres");
        let pass = self.password.as_deref().unwrap_or("");
        format!(
            "postgres://{}:{}@{}:{}/{}",
            user, pass, self.host, self.port, self.database
        )
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

// ── Ingestion ticker ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerConfig {
    pub enabled: bool,
    pub interval_secs: u64,
}

impl TickerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            enabled: profiled_env_bool(p, "TICKER_ENABLED", true),
            interval_secs: profiled_env_parse::<u64>(p, "TICKER_INTERVAL_SECS", 10).max(1),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

// ── Dashboard ─────────────────────────────────────────────────

/// Upper bound for the realtime window (ten years).
pub const MAX_REALTIME_WINDOW_HOURS: i64 = 24 * 365 * 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Client-side polling period.
    pub refresh_secs: u64,
    /// Trailing window counted as realtime activity.
    pub realtime_window_hours: i64,
    pub spark_master_url: String,
    pub namenode_ui_url: String,
    pub yarn_ui_url: String,
}

impl DashboardConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            refresh_secs: profiled_env_parse::<u64>(p, "DASHBOARD_REFRESH_SECS", 5).max(1),
            realtime_window_hours: profiled_env_parse::<i64>(p, "REALTIME_WINDOW_HOURS", 24)
                .clamp(1, MAX_REALTIME_WINDOW_HOURS),
            spark_master_url: profiled_env_or(p, "SPARK_MASTER_URL", "http://localhost:8080"),
            namenode_ui_url: profiled_env_or(p, "NAMENODE_UI_URL", "http://localhost:9870"),
            yarn_ui_url: profiled_env_or(p, "YARN_UI_URL", "http://localhost:8088"),
        }
    }

    pub fn realtime_window(&self) -> chrono::Duration {
        let hours = self.realtime_window_hours.clamp(1, MAX_REALTIME_WINDOW_HOURS);
        chrono::Duration::try_hours(hours).unwrap_or_else(|| chrono::Duration::hours(24))
    }
}

// ── Infrastructure probes ─────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// `None` disables the probe (reported as NOT_CONFIGURED).
    pub namenode_url: Option<String>,
    pub resourcemanager_url: Option<String>,
    pub timeout_secs: u64,
}

impl ProbeConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            namenode_url: profiled_probe_url(p, "NAMENODE_URL", "http://hadoop-master:9870/jmx"),
            resourcemanager_url: profiled_probe_url(
                p,
                "RESOURCEMANAGER_URL",
                "http://hadoop-master:8088/ws/v1/cluster/info",
            ),
            timeout_secs: profiled_env_parse::<u64>(p, "PROBE_TIMEOUT_SECS", 3).max(1),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test uses its own profile prefix so parallel tests don't collide.

    #[test]
    fn test_defaults() {
        let config = Config::for_profile("CFGTESTDEFAULTS");
        assert_eq!(config.profile_label(), "CFGTESTDEFAULTS");
        assert_eq!(Config::for_profile("").profile_label(), "default");
        assert!(config.ticker.interval() >= Duration::from_secs(1));
        assert_eq!(config.dashboard.realtime_window(), chrono::Duration::hours(config.dashboard.realtime_window_hours));
        assert!(config.probes.timeout_secs >= 1);
    }

    #[test]
    fn test_profile_prefix_wins() {
        env::set_var("CFGTESTPROF_TICKER_INTERVAL_SECS", "42");
        env::set_var("CFGTESTPROF_TICKER_ENABLED", "false");
        let config = Config::for_profile("cfgtestprof");
        assert_eq!(config.profile, "CFGTESTPROF");
        assert_eq!(config.ticker.interval_secs, 42);
        assert!(!config.ticker.enabled);
    }

    #[test]
    fn test_empty_probe_url_disables_probe() {
        env::set_var("CFGTESTPROBE_NAMENODE_URL", "");
        env::set_var("CFGTESTPROBE_RESOURCEMANAGER_URL", "http://rm:8088/ws/v1/cluster/info");
        let config = Config::for_profile("CFGTESTPROBE");
        assert_eq!(config.probes.namenode_url, None);
        assert_eq!(
            config.probes.resourcemanager_url.as_deref(),
            Some("http://rm:8088/ws/v1/cluster/info")
        );
    }

    #[test]
    fn test_postgres_url_precedence() {
        env::set_var("CFGTESTPG_PG_URL", "postgres://u:p@db:5432/sales");
        let config = Config::for_profile("CFGTESTPG");
        assert!(config.postgres.is_configured());
        assert_eq!(config.postgres.database_url(), "postgres://u:p@db:5432/sales");
    }

    #[test]
    fn test_realtime_window_is_clamped() {
        env::set_var("CFGTESTWIDEWIN_REALTIME_WINDOW_HOURS", "3000000000");
        let wide = Config::for_profile("CFGTESTWIDEWIN");
        assert_eq!(wide.dashboard.realtime_window_hours, MAX_REALTIME_WINDOW_HOURS);
        assert_eq!(wide.dashboard.realtime_window(), chrono::Duration::hours(MAX_REALTIME_WINDOW_HOURS));

        env::set_var("CFGTESTNEGWIN_REALTIME_WINDOW_HOURS", "-5");
        let negative = Config::for_profile("CFGTESTNEGWIN");
        assert_eq!(negative.dashboard.realtime_window_hours, 1);

        let mut direct = negative.dashboard.clone();
        direct.realtime_window_hours = i64::MAX;
        assert_eq!(direct.realtime_window(), chrono::Duration::hours(MAX_REALTIME_WINDOW_HOURS));

        let now = chrono::Utc::now();
        let s = crate::aggregate::stats_snapshot(&[], &[], now, wide.dashboard.realtime_window());
        assert_eq!(s.realtime_sales, 0);
    }

    #[test]
    fn test_invalid_number_falls_back() {
        env::set_var("CFGTESTBAD_PORT", "not-a-port");
        let config = Config::for_profile("CFGTESTBAD");
        let fallback = Config::for_profile("CFGTESTBADNONE");
        assert_eq!(config.server.port, fallback.server.port);
    }
}
