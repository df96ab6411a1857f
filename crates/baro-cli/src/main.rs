use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use baro_core::load_source_records;
use baro_ingest::{HttpSource, Orchestrator};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    // Observability
    baro_obs::init("barod");

    // Config
    let cfg = baro_config::AppConfig::load().context("Failed to load configuration")?;
    let http_bind = cfg.http_bind();

    let source_records = match cfg.dataset_path() {
        Some(path) => load_source_records(&path)
            .with_context(|| format!("Failed to load dataset {}", path.display()))?,
        None => {
            tracing::info!("no source dataset configured, / will answer 204");
            Vec::new()
        }
    };

    let source = HttpSource::new(cfg.request_timeout()).context("Failed to build HTTP client")?;
    let backend_url = cfg.backend_url();
    let orchestrator = Arc::new(
        Orchestrator::try_new(Arc::new(source), &backend_url, cfg.normalize_options())
            .with_context(|| format!("Invalid backend URL {backend_url:?}"))?,
    );

    // Build app and state
    let (app, state) = baro_cli::build_app(orchestrator, source_records)?;

    // Start HTTP server
    let addr: SocketAddr = http_bind.parse().context("Invalid HTTP bind address")?;
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind TCP listener")?;

    // Mark ready just before serving
    baro_cli::set_ready(&state, true);

    // Initial load; the backend may be this very process, so it runs after bind
    tokio::spawn({
        let state = Arc::clone(&state);
        async move {
            baro_cli::refresh(&state).await;
        }
    });

    tracing::info!(%addr, backend = %backend_url, "HTTP server listening");
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
