/**
 * EXPORT SURFACE - HTTP endpoint scraped by Prometheus
 *
 * ROUTES :
 * - GET /metrics        : runs one collection cycle, returns text exposition format
 * - GET /health         : process liveness, never touches Moonraker
 * - GET /system/health  : exporter bookkeeping as JSON
 * - GET /               : landing text
 *
 * Every scrape runs its own cycle with a fresh sample set; a failed cycle still
 * answers 200 with `moonraker_up 0`.
 */

use crate::collector::Collector;
use crate::exposition::{render, CONTENT_TYPE};
use crate::fetcher::StatusFetcher;
use crate::health::{ExporterHealth, HealthTracker};
use crate::metrics::{MetricDefs, SampleSet};
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub collector: Arc<Collector<StatusFetcher>>,
    pub defs: Arc<MetricDefs>,
    pub health_tracker: HealthTracker,
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(|| async { "ok" }))
        .route("/system/health", get(get_system_health))
        .route("/metrics", get(get_metrics))
        .with_state(app_state)
}

async fn index() -> &'static str {
    "Moonraker Exporter\n\nMetrics are served on /metrics\n"
}

// GET /metrics (one collection cycle per scrape)
async fn get_metrics(State(app): State<AppState>) -> impl IntoResponse {
    let mut set = SampleSet::new();
    let outcome = app.collector.run_cycle(&mut set).await;
    app.health_tracker.record(&outcome);
    ([(header::CONTENT_TYPE, CONTENT_TYPE)], render(&app.defs, &set))
}

// GET /system/health
async fn get_system_health(State(app): State<AppState>) -> Json<ExporterHealth> {
    Json(app.health_tracker.get_health())
}
