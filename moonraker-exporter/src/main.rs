/**
 * MOONRAKER EXPORTER - Process entry point
 *
 * ROLE : Loads env config and the object catalog, then serves /metrics.
 * A missing or invalid catalog aborts startup; upstream failures never do.
 */

use anyhow::{Context, Result};
use moonraker_exporter::{build_app, CatalogSource, ExporterConfig};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Charger les variables d'environnement depuis .env (si présent)
    dotenvy::dotenv().ok();

    let config = ExporterConfig::from_env().context("Invalid exporter configuration")?;
    init_logging(&config.log_level);

    info!("Starting server to collect Moonraker API metrics");
    info!(endpoint = %config.endpoint, printer = %config.printer, "preparing to collect metrics");

    let catalog = CatalogSource::open(&config.catalog_path, config.catalog_reload)
        .await
        .with_context(|| format!("Failed to load object catalog {}", config.catalog_path.display()))?;

    let app = build_app(&config, catalog).context("Failed to build Moonraker HTTP client")?;

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    info!("listening on http://{}/metrics", config.listen_addr);
    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("moonraker_exporter={level},warn")));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
