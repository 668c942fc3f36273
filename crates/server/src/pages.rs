//! Server-rendered HTML pages.
//!
//! Both pages render the current snapshot on the server and then poll the
//! JSON API on a client-side timer. Templates are inline strings rendered
//! through a fresh [`minijinja::Environment`] per request.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use salesdash_core::StatsSnapshot;

use crate::panels::{self, Bar, Panel};
use crate::state::AppState;

type PageResult = Result<Html<String>, (StatusCode, String)>;

fn build_env() -> minijinja::Environment<'static> {
    let mut env = minijinja::Environment::new();
    // Inline templates have no file extension to infer escaping from.
    env.set_auto_escape_callback(|_| minijinja::AutoEscape::Html);
    env.add_filter("money", money_filter);
    env.add_global("style", minijinja::Value::from_safe_string(STYLE.to_string()));
    env
}

/// `1234.5` → `$1,234.50`
fn money_filter(value: f64) -> String {
    let cents = format!("{:.2}", value.abs());
    let (whole, frac) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, frac)
}

fn render<S: Serialize>(template: &str, ctx: S) -> PageResult {
    build_env()
        .render_str(template, ctx)
        .map(Html)
        .map_err(|e| {
            warn!(error = %e, "template render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })
}

// ── Contexts ─────────────────────────────────────────────────────────

#[derive(Serialize)]
struct Links<'a> {
    namenode: &'a str,
    yarn: &'a str,
    spark: &'a str,
}

#[derive(Serialize)]
struct LandingContext<'a> {
    stats: Option<StatsSnapshot>,
    error: Option<String>,
    refresh_ms: u64,
    links: Links<'a>,
    generated_at: String,
}

#[derive(Serialize)]
struct BarPanel {
    bars: Vec<Bar>,
    reason: Option<String>,
}

impl BarPanel {
    fn from_panel<T>(panel: &Panel<Vec<T>>, to_bars: fn(&[T]) -> Vec<Bar>) -> Self {
        match panel {
            Panel::Ok { data } => Self {
                bars: to_bars(data),
                reason: None,
            },
            Panel::NoData { reason } => Self {
                bars: Vec::new(),
                reason: Some(reason.clone()),
            },
        }
    }
}

#[derive(Serialize)]
struct DashboardContext {
    stats: Option<StatsSnapshot>,
    stats_reason: Option<String>,
    categories: BarPanel,
    regions: BarPanel,
    refresh_ms: u64,
    generated_at: String,
}

// ── Handlers ─────────────────────────────────────────────────────────

/// `GET /`
pub async fn landing(State(state): State<Arc<AppState>>) -> PageResult {
    let now = Utc::now();
    let (stats, error) = match state.store.stats(now, state.dashboard.realtime_window()).await {
        Ok(s) => (Some(s), None),
        Err(e) => {
            warn!(error = %e, "landing page stats unavailable");
            (None, Some(e.to_string()))
        }
    };
    let d = &state.dashboard;
    render(
        LANDING_TEMPLATE,
        LandingContext {
            stats,
            error,
            refresh_ms: d.refresh_secs * 1000,
            links: Links {
                namenode: &d.namenode_ui_url,
                yarn: &d.yarn_ui_url,
                spark: &d.spark_master_url,
            },
            generated_at: now.to_rfc3339(),
        },
    )
}

/// `GET /dashboard`
pub async fn dashboard(State(state): State<Arc<AppState>>) -> PageResult {
    let loaded = panels::load(state.store.as_ref(), state.dashboard.realtime_window()).await;
    let (stats, stats_reason) = match loaded.stats {
        Panel::Ok { data } => (Some(data), None),
        Panel::NoData { reason } => (None, Some(reason)),
    };
    render(
        DASHBOARD_TEMPLATE,
        DashboardContext {
            stats,
            stats_reason,
            categories: BarPanel::from_panel(&loaded.categories, panels::category_bars),
            regions: BarPanel::from_panel(&loaded.regions, panels::region_bars),
            refresh_ms: state.dashboard.refresh_secs * 1000,
            generated_at: Utc::now().to_rfc3339(),
        },
    )
}

// ── Templates ────────────────────────────────────────────────────────

const STYLE: &str = r#"
  body { font-family: system-ui, sans-serif; margin: 0; background: #f4f6f9; color: #1f2933; }
  header { background: #1f3a5f; color: #fff; padding: 16px 32px; }
  header a { color: #cfe3ff; margin-right: 16px; }
  main { padding: 24px 32px; }
  .cards { display: flex; gap: 16px; flex-wrap: wrap; }
  .card { background: #fff; border-radius: 8px; padding: 16px 20px; min-width: 180px; box-shadow: 0 1px 3px rgba(0,0,0,.1); }
  .card .label { font-size: 12px; text-transform: uppercase; color: #6b7785; }
  .card .value { font-size: 26px; font-weight: 600; margin-top: 4px; }
  .panel { background: #fff; border-radius: 8px; padding: 16px 20px; margin-top: 20px; box-shadow: 0 1px 3px rgba(0,0,0,.1); }
  .bar-row { display: flex; align-items: center; margin: 6px 0; }
  .bar-label { width: 120px; }
  .bar-track { flex: 1; background: #e6ebf1; border-radius: 4px; margin: 0 12px; }
  .bar { background: #3b82f6; height: 14px; border-radius: 4px; }
  .no-data { color: #9aa5b1; font-style: italic; }
  .error { color: #b42318; }
  .UP { color: #15803d; } .DOWN { color: #b42318; } .NOT_CONFIGURED { color: #9aa5b1; }
  footer { color: #9aa5b1; font-size: 12px; padding: 0 32px 24px; }
"#;

const LANDING_TEMPLATE: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Sales Analytics</title>
<style>{{ style }}</style>
</head>
<body>
<header>
  <h1>Sales Analytics</h1>
  <nav>
    <a href="/dashboard">Dashboard</a>
    <a href="/api/stats">Stats API</a>
    <a href="{{ links.namenode }}">HDFS NameNode</a>
    <a href="{{ links.yarn }}">YARN</a>
    <a href="{{ links.spark }}">Spark Master</a>
  </nav>
</header>
<main>
  <div class="cards" id="cards">
  {% if stats %}
    <div class="card"><div class="label">Total sales</div><div class="value">{{ stats.total_sales }}</div></div>
    <div class="card"><div class="label">Revenue</div><div class="value">{{ stats.total_revenue | money }}</div></div>
    <div class="card"><div class="label">Realtime sales</div><div class="value">{{ stats.realtime_sales }}</div></div>
    <div class="card"><div class="label">Customers</div><div class="value">{{ stats.unique_customers }}</div></div>
  {% else %}
    <div class="card no-data">No data available<div class="error">{{ error }}</div></div>
  {% endif %}
  </div>
  <div class="panel">
    <h2>Services</h2>
    <ul id="services">
      <li>HDFS NameNode: <span id="svc-namenode">checking…</span></li>
      <li>YARN ResourceManager: <span id="svc-resourcemanager">checking…</span></li>
      <li>Shared store: <span id="svc-store">checking…</span></li>
    </ul>
  </div>
</main>
<footer>Rendered {{ generated_at }}</footer>
<script>
const REFRESH_MS = {{ refresh_ms }};
function money(v) {
  return "$" + Number(v).toLocaleString("en-US", { minimumFractionDigits: 2, maximumFractionDigits: 2 });
}
function esc(s) {
  return String(s).replace(/[&<>"]/g, c => ({ "&": "&amp;", "<": "&lt;", ">": "&gt;", '"': "&quot;" })[c]);
}
function card(label, value) {
  return '<div class="card"><div class="label">' + label + '</div><div class="value">' + value + "</div></div>";
}
function noDataCard(reason) {
  return '<div class="card no-data">No data available<div class="error">' + esc(reason) + "</div></div>";
}
// Redraw every cycle so an outage at first render recovers once the store is back.
async function refreshStats() {
  const cards = document.getElementById("cards");
  try {
    const s = await (await fetch("/api/stats")).json();
    cards.innerHTML = s.error
      ? noDataCard(s.error)
      : card("Total sales", s.total_sales) + card("Revenue", money(s.total_revenue)) +
        card("Realtime sales", s.realtime_sales) + card("Customers", s.unique_customers);
  } catch (e) {
    cards.innerHTML = noDataCard("stats request failed");
  }
}
async function refreshStatus() {
  try {
    const s = await (await fetch("/api/status")).json();
    for (const key of ["namenode", "resourcemanager", "store"]) {
      const el = document.getElementById("svc-" + key);
      el.textContent = s[key];
      el.className = s[key];
    }
  } catch (e) { /* next cycle retries */ }
}
refreshStatus();
setInterval(refreshStats, REFRESH_MS);
setInterval(refreshStatus, REFRESH_MS * 6);
</script>
</body>
</html>
"#;

const DASHBOARD_TEMPLATE: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Sales Dashboard</title>
<style>{{ style }}</style>
</head>
<body>
<header>
  <h1>Sales Dashboard</h1>
  <nav><a href="/">Home</a><a href="/api/dashboard">Dashboard API</a></nav>
</header>
<main>
  <div class="cards" id="stats">
  {% if stats %}
    <div class="card"><div class="label">Total sales</div><div class="value">{{ stats.total_sales }}</div></div>
    <div class="card"><div class="label">Revenue</div><div class="value">{{ stats.total_revenue | money }}</div></div>
    <div class="card"><div class="label">Realtime sales</div><div class="value">{{ stats.realtime_sales }}</div></div>
    <div class="card"><div class="label">Customers</div><div class="value">{{ stats.unique_customers }}</div></div>
  {% else %}
    <div class="card no-data">No data available: {{ stats_reason }}</div>
  {% endif %}
  </div>
  {% for title, id, panel in [("Revenue by category", "categories", categories), ("Revenue by region", "regions", regions)] %}
  <div class="panel">
    <h2>{{ title }}</h2>
    <div id="{{ id }}">
    {% if panel.bars %}
      {% for bar in panel.bars %}
      <div class="bar-row">
        <span class="bar-label">{{ bar.label }}</span>
        <span class="bar-track"><div class="bar" style="width: {{ bar.width_pct }}%"></div></span>
        <span>{{ bar.revenue | money }} ({{ bar.orders }} orders)</span>
      </div>
      {% endfor %}
    {% else %}
      <p class="no-data">No data available: {{ panel.reason }}</p>
    {% endif %}
    </div>
  </div>
  {% endfor %}
</main>
<footer>Rendered <span id="generated_at">{{ generated_at }}</span></footer>
<script>
const REFRESH_MS = {{ refresh_ms }};
function money(v) {
  return "$" + Number(v).toLocaleString("en-US", { minimumFractionDigits: 2, maximumFractionDigits: 2 });
}
function esc(s) {
  return String(s).replace(/[&<>"]/g, c => ({ "&": "&amp;", "<": "&lt;", ">": "&gt;", '"': "&quot;" })[c]);
}
function noData(reason) {
  return '<p class="no-data">No data available: ' + esc(reason) + "</p>";
}
function card(label, value) {
  return '<div class="card"><div class="label">' + label + '</div><div class="value">' + value + "</div></div>";
}
function renderBars(panel, labelKey) {
  if (panel.status !== "ok") return noData(panel.reason);
  const max = Math.max(...panel.data.map(r => r.revenue), 0);
  return panel.data.map(r => {
    const pct = max > 0 ? (r.revenue / max * 100).toFixed(1) : 0;
    return '<div class="bar-row"><span class="bar-label">' + esc(r[labelKey]) +
      '</span><span class="bar-track"><div class="bar" style="width: ' + pct +
      '%"></div></span><span>' + money(r.revenue) + " (" + r.orders + " orders)</span></div>";
  }).join("");
}
async function refresh() {
  try {
    const d = await (await fetch("/api/dashboard")).json();
    const s = d.stats;
    document.getElementById("stats").innerHTML = s.status === "ok"
      ? card("Total sales", s.data.total_sales) + card("Revenue", money(s.data.total_revenue)) +
        card("Realtime sales", s.data.realtime_sales) + card("Customers", s.data.unique_customers)
      : '<div class="card no-data">No data available: ' + esc(s.reason) + "</div>";
    document.getElementById("categories").innerHTML = renderBars(d.categories, "category");
    document.getElementById("regions").innerHTML = renderBars(d.regions, "region");
    document.getElementById("generated_at").textContent = d.timestamp;
  } catch (e) { /* next cycle retries */ }
}
setInterval(refresh, REFRESH_MS);
</script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_filter_groups_thousands() {
        assert_eq!(money_filter(0.0), "$0.00");
        assert_eq!(money_filter(4700.0), "$4,700.00");
        assert_eq!(money_filter(1234567.891), "$1,234,567.89");
        assert_eq!(money_filter(999.999), "$1,000.00");
        assert_eq!(money_filter(-12.5), "-$12.50");
    }

    #[test]
    fn test_landing_script_redraws_cards_on_every_outcome() {
        let html = build_env()
            .render_str(
                LANDING_TEMPLATE,
                LandingContext {
                    stats: None,
                    error: Some("store offline".to_string()),
                    refresh_ms: 5000,
                    links: Links {
                        namenode: "http://nn",
                        yarn: "http://yarn",
                        spark: "http://spark",
                    },
                    generated_at: "now".to_string(),
                },
            )
            .unwrap();

        assert!(html.contains(r#"id="cards""#));
        assert!(html.contains("No data available"));
        assert!(html.contains("store offline"));

        let script = &html[html.find("<script>").unwrap()..];
        let body = &script[script.find("async function refreshStats").unwrap()..];
        let body = &body[..body.find("async function refreshStatus").unwrap()];
        assert_eq!(body.matches("cards.innerHTML =").count(), 2, "success/error and fetch failure both redraw");
        assert!(body.contains("noDataCard(s.error)"));
        assert!(!body.contains("return;"), "an error response must not leave stale cards");
    }

    #[test]
    fn test_templates_parse() {
        let env = build_env();
        env.template_from_str(LANDING_TEMPLATE).unwrap();
        env.template_from_str(DASHBOARD_TEMPLATE).unwrap();
    }
}
