use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use baro_core::NormalizeOptions;
use baro_ingest::{CannedSource, Orchestrator};
use tower::ServiceExt;

fn orchestrator() -> Arc<Orchestrator> {
    Arc::new(Orchestrator::new(
        Arc::new(CannedSource::respond(500, "")),
        "http://localhost:8080",
        NormalizeOptions::default(),
    ))
}

#[tokio::test]
async fn health_ready_metrics_endpoints() {
    let (app, state) = baro_cli::build_app(orchestrator(), Vec::new()).unwrap();

    // /healthz returns 200 and increments a counter
    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // /readyz initially 503
    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/readyz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    baro_cli::set_ready(&state, true);

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/readyz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // a fetch so the outcome counter exists
    baro_cli::refresh(&state).await.unwrap();

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let ct = res.headers().get("content-type").unwrap().to_str().unwrap();
    assert!(ct.starts_with("text/plain"));
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("baro_requests_total"));
    assert!(text.contains("baro_fetch_total"));
    assert!(text.contains("fallback"));
}
