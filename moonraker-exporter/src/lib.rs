//! Moonraker Exporter - Prometheus bridge for Klipper printers driven by Moonraker
//!
//! Polls the Moonraker HTTP API on every scrape and republishes object status as gauges:
//! - Object catalog: operator-declared `{name, type}` list (YAML)
//! - Status fetcher: `/printer/info` probe + one batched `/printer/objects/query`
//! - Decoder: typed projection of each object's status, one metric set per type
//! - Export surface: `/metrics` in Prometheus text format

pub mod catalog;
pub mod collector;
pub mod config;
pub mod decoder;
pub mod exposition;
pub mod fetcher;
pub mod fields;
pub mod health;
pub mod http;
pub mod metrics;
pub mod models;
pub mod state;

pub use catalog::{Catalog, CatalogSource, ObjectDeclaration, TypeTag};
pub use collector::{Collector, CycleOutcome};
pub use config::{ConfigError, ExporterConfig};
pub use decoder::Decoder;
pub use fetcher::{FetchError, StatusFetcher, StatusSource};
pub use metrics::{MetricDefs, MetricSample, MetricSink, SampleSet};

use std::sync::Arc;

/// Wires the HTTP application from an already opened catalog.
pub fn build_app(config: &ExporterConfig, catalog: CatalogSource) -> Result<axum::Router, reqwest::Error> {
    let fetcher = StatusFetcher::new(config.endpoint.clone(), config.timeout)?;
    let collector = Collector::new(fetcher, Decoder::new(config.printer.clone()), catalog);
    let app_state = http::AppState {
        collector: Arc::new(collector),
        defs: Arc::new(MetricDefs::standard()),
        health_tracker: health::HealthTracker::new(config.endpoint.clone(), config.printer.clone()),
    };
    Ok(http::build_router(app_state))
}
