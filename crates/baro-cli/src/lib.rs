use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Result;
use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use baro_core::SourceRecord;
use baro_ingest::{Orchestrator, TriggerOutcome};
use opentelemetry::{
    metrics::{Counter, MeterProvider},
    KeyValue,
};
use opentelemetry_prometheus::exporter;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::{Encoder, Registry, TextEncoder};
use serde::Deserialize;

pub struct AppState {
    ready: AtomicBool,
    registry: Registry,
    #[allow(dead_code)]
    provider: SdkMeterProvider,
    requests_total: Counter<u64>,
    fetch_total: Counter<u64>,
    orchestrator: Arc<Orchestrator>,
    source_records: Vec<SourceRecord>,
}

/// Router for the dashboard API plus the source dataset served at `/`
pub fn build_app(
    orchestrator: Arc<Orchestrator>,
    source_records: Vec<SourceRecord>,
) -> Result<(Router, Arc<AppState>)> {
    // Prometheus exporter via OpenTelemetry
    let registry = Registry::new();
    let reader = exporter().with_registry(registry.clone()).build()?;
    let provider = SdkMeterProvider::builder().with_reader(reader).build();
    let meter = provider.meter("baro-cli");

    let requests_total = meter
        .u64_counter("baro_requests_total")
        .with_description("Total HTTP requests served")
        .init();
    let fetch_total = meter
        .u64_counter("baro_fetch_total")
        .with_description("Backend fetch triggers by outcome")
        .init();

    let state = Arc::new(AppState {
        ready: AtomicBool::new(false),
        registry,
        provider,
        requests_total,
        fetch_total,
        orchestrator,
        source_records,
    });

    let router = Router::new()
        .route("/", get(source_dataset))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/v1/dashboard", get(dashboard))
        .route("/api/v1/records", get(records))
        .route("/api/v1/stats", get(stats))
        .route("/api/v1/refresh", post(refresh_handler))
        .route("/api/v1/backend", put(set_backend))
        .with_state(Arc::clone(&state));

    Ok((router, state))
}

pub fn set_ready(state: &Arc<AppState>, is_ready: bool) {
    state.ready.store(is_ready, Ordering::Relaxed);
}

/// Trigger one fetch and record its outcome
///
/// The fetch runs on its own task so a dropped HTTP request cannot cancel it
/// halfway through a state transition.
pub async fn refresh(state: &Arc<AppState>) -> Option<TriggerOutcome> {
    let orchestrator = Arc::clone(&state.orchestrator);
    let outcome = match tokio::spawn(async move { orchestrator.trigger_fetch().await }).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(error = ?e, "fetch task failed");
            return None;
        }
    };

    let label = match &outcome {
        TriggerOutcome::Completed(snapshot) if snapshot.error.is_none() => "success",
        TriggerOutcome::Completed(_) => "fallback",
        TriggerOutcome::AlreadyLoading => "rejected",
    };
    state
        .fetch_total
        .add(1, &[KeyValue::new("outcome", label)]);
    Some(outcome)
}

async fn source_dataset(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.requests_total.add(1, &[]);
    let cors = (
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    if state.source_records.is_empty() {
        return ([cors], StatusCode::NO_CONTENT).into_response();
    }
    ([cors], Json(&state.source_records)).into_response()
}

async fn healthz(State(state): State<Arc<AppState>>) -> StatusCode {
    state.requests_total.add(1, &[]);
    StatusCode::OK
}

async fn readyz(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.ready.load(Ordering::Relaxed) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn metrics(
    State(state): State<Arc<AppState>>,
) -> (
    [(axum::http::header::HeaderName, axum::http::HeaderValue); 1],
    String,
) {
    let encoder = TextEncoder::new();
    let metric_families = state.registry.gather();
    let mut buf = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buf) {
        tracing::warn!(error=?e, "failed to encode metrics");
    }
    let body = String::from_utf8(buf).unwrap_or_default();
    let header = (
        header::CONTENT_TYPE,
        axum::http::HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
    );
    ([header], body)
}

async fn dashboard(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.requests_total.add(1, &[]);
    Json(state.orchestrator.snapshot().await)
}

async fn records(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.requests_total.add(1, &[]);
    Json(state.orchestrator.snapshot().await.records)
}

async fn stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.requests_total.add(1, &[]);
    Json(state.orchestrator.snapshot().await.stats)
}

async fn refresh_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.requests_total.add(1, &[]);
    match refresh(&state).await {
        Some(TriggerOutcome::Completed(snapshot)) => (StatusCode::OK, Json(snapshot)).into_response(),
        Some(TriggerOutcome::AlreadyLoading) => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({"error": "fetch already in progress"})),
        )
            .into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

#[derive(Deserialize)]
struct BackendUpdate {
    url: String,
}

async fn set_backend(
    State(state): State<Arc<AppState>>,
    Json(update): Json<BackendUpdate>,
) -> impl IntoResponse {
    state.requests_total.add(1, &[]);
    match state.orchestrator.set_backend_url(update.url.trim()).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({"backendUrl": state.orchestrator.backend_url().await})),
        )
            .into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}
