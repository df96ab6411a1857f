//! Fetch orchestration and the observable dashboard state
//!
//! `Idle -> Loading -> {Success, Failure}`, re-entering `Loading` on every
//! trigger. Failure still ends with a renderable dataset: the sample record
//! run through the same pipeline.

use crate::{decode_response, FetchError, FetchResult, ObservationSource};
use baro_core::{fallback_dataset, Dataset, NormalizeOptions, NormalizedRecord, StatsSummary};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchPhase {
    Idle,
    Loading,
    Success,
    Failure,
}

/// Read-only view of the current state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub phase: FetchPhase,
    pub loading: bool,
    pub error: Option<String>,
    pub backend_url: String,
    pub records: Vec<NormalizedRecord>,
    pub stats: StatsSummary,
    pub updated_at: Option<DateTime<Utc>>,
}

impl DashboardSnapshot {
    fn idle(backend_url: String) -> Self {
        Self {
            phase: FetchPhase::Idle,
            loading: false,
            error: None,
            backend_url,
            records: Vec::new(),
            stats: StatsSummary::empty(),
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    /// The fetch ran to completion (successfully or via the sample data)
    Completed(DashboardSnapshot),

    /// Another trigger is in flight; no request was issued
    AlreadyLoading,
}

/// Dataset to display plus the failure that forced it, if any
#[derive(Debug, Clone, PartialEq)]
pub struct Recovered {
    pub dataset: Dataset,
    pub error: Option<FetchError>,
}

/// Replace a failed load with the sample dataset
pub fn recover(result: FetchResult<Dataset>, options: &NormalizeOptions) -> Recovered {
    match result {
        Ok(dataset) => Recovered {
            dataset,
            error: None,
        },
        Err(error) => Recovered {
            dataset: fallback_dataset(options),
            error: Some(error),
        },
    }
}

/// Owns the dashboard state; [`Orchestrator::trigger_fetch`] is the only
/// transition entry point
pub struct Orchestrator {
    source: Arc<dyn ObservationSource>,
    options: NormalizeOptions,
    state: RwLock<DashboardSnapshot>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when the trigger finishes or is dropped
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Orchestrator {
    pub fn new(
        source: Arc<dyn ObservationSource>,
        backend_url: impl Into<String>,
        options: NormalizeOptions,
    ) -> Self {
        Self {
            source,
            options,
            state: RwLock::new(DashboardSnapshot::idle(backend_url.into())),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Like [`Orchestrator::new`], but rejects a backend URL that
    /// [`Orchestrator::set_backend_url`] would reject
    pub fn try_new(
        source: Arc<dyn ObservationSource>,
        backend_url: &str,
        options: NormalizeOptions,
    ) -> FetchResult<Self> {
        validate_backend_url(backend_url)?;
        Ok(Self::new(source, backend_url, options))
    }

    /// Run one fetch against the configured backend
    ///
    /// Exactly one request is issued. Failures are logged and recovered
    /// with the sample dataset; the error text stays visible in the
    /// snapshot.
    #[instrument(skip(self), fields(source = self.source.name()))]
    pub async fn trigger_fetch(&self) -> TriggerOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("fetch already in progress, ignoring trigger");
            return TriggerOutcome::AlreadyLoading;
        }
        let _guard = InFlight(&self.in_flight);

        let url = {
            let mut state = self.state.write().await;
            state.phase = FetchPhase::Loading;
            state.loading = true;
            state.error = None;
            state.backend_url.clone()
        };

        let result = self.load(&url).await;
        if let Err(err) = &result {
            warn!(kind = err.kind(), error = %err, %url, "fetch failed, using sample data");
        }
        let recovered = recover(result, &self.options);
        let phase = match recovered.error {
            Some(_) => FetchPhase::Failure,
            None => FetchPhase::Success,
        };

        let mut state = self.state.write().await;
        state.phase = phase;
        state.loading = false;
        state.error = recovered.error.map(|e| e.to_string());
        state.stats = recovered.dataset.stats;
        state.records = recovered.dataset.records;
        state.updated_at = Some(Utc::now());
        info!(
            phase = ?state.phase,
            records = state.records.len(),
            "dashboard state updated"
        );

        TriggerOutcome::Completed(state.clone())
    }

    async fn load(&self, url: &str) -> FetchResult<Dataset> {
        let response = self.source.fetch(url).await?;
        decode_response(&response, &self.options)
    }

    pub async fn snapshot(&self) -> DashboardSnapshot {
        self.state.read().await.clone()
    }

    pub async fn backend_url(&self) -> String {
        self.state.read().await.backend_url.clone()
    }

    /// Point later triggers at a new backend. Does not fetch.
    pub async fn set_backend_url(&self, url: &str) -> FetchResult<()> {
        validate_backend_url(url)?;
        let mut state = self.state.write().await;
        info!(from = %state.backend_url, to = %url, "backend url changed");
        state.backend_url = url.to_string();
        Ok(())
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn options(&self) -> &NormalizeOptions {
        &self.options
    }
}

/// Backend locations must be absolute http or https URLs
pub fn validate_backend_url(url: &str) -> FetchResult<()> {
    let parsed = url::Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(FetchError::InvalidUrl(format!(
            "unsupported scheme: {}",
            parsed.scheme()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CannedSource;
    use baro_core::ExtremumPresence;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    const URL: &str = "http://localhost:8080";

    fn orchestrator(source: CannedSource) -> Orchestrator {
        Orchestrator::new(Arc::new(source), URL, NormalizeOptions::default())
    }

    fn completed(outcome: TriggerOutcome) -> DashboardSnapshot {
        match outcome {
            TriggerOutcome::Completed(snapshot) => snapshot,
            TriggerOutcome::AlreadyLoading => panic!("trigger was rejected"),
        }
    }

    #[tokio::test]
    async fn test_starts_idle() {
        let orch = orchestrator(CannedSource::respond(200, "[]"));
        let snapshot = orch.snapshot().await;
        assert_eq!(snapshot.phase, FetchPhase::Idle);
        assert!(snapshot.records.is_empty());
        assert_eq!(snapshot.stats, StatsSummary::empty());
        assert_eq!(snapshot.backend_url, URL);
        assert!(!orch.is_loading());
    }

    #[tokio::test]
    async fn test_success() {
        let body = r#"[
            {"nuts1":"AT13","districtCode":91900,"refYear":1872,"refDate":187205,"p":"990.9"},
            {"NUTS":"AT13","DISTRICT_CODE":91900,"REF_YEAR":1872,"REF_DATE":187206,"P":"1000.1"}
        ]"#;
        let source = CannedSource::respond(200, body);
        let counter = source.request_counter();
        let orch = orchestrator(source);

        let snapshot = completed(orch.trigger_fetch().await);
        assert_eq!(snapshot.phase, FetchPhase::Success);
        assert!(!snapshot.loading);
        assert_eq!(snapshot.error, None);
        assert_eq!(snapshot.records.len(), 2);
        assert_eq!(snapshot.stats.total_records, 2);
        assert_eq!(format!("{:.1}", snapshot.stats.avg_pressure), "995.5");
        assert!(snapshot.updated_at.is_some());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(orch.snapshot().await, snapshot);
    }

    #[tokio::test]
    async fn test_http_500_falls_back() {
        let orch = orchestrator(CannedSource::respond(500, "oops"));
        let snapshot = completed(orch.trigger_fetch().await);

        assert_eq!(snapshot.phase, FetchPhase::Failure);
        assert_eq!(snapshot.error.as_deref(), Some("HTTP error! Status: 500"));
        assert_eq!(snapshot.records.len(), 1);
        assert_eq!(snapshot.records[0].region, "AT13");
        assert_eq!(snapshot.stats.avg_pressure, 990.9);
        assert_eq!(snapshot.stats.max_pressure, 1003.2);
        assert_eq!(snapshot.stats.min_pressure, 981.2);
        assert_eq!(snapshot.stats.total_records, 1);
    }

    #[tokio::test]
    async fn test_parse_empty_and_transport_fall_back() {
        let cases = [
            (
                CannedSource::respond(200, "not json"),
                "Backend returned invalid JSON. Check data format.",
            ),
            (
                CannedSource::respond(200, "[]"),
                "No data returned from backend",
            ),
            (
                CannedSource::from_outcome(Err(FetchError::Transport("connection refused".into()))),
                "Network error: connection refused",
            ),
        ];

        for (source, message) in cases {
            let snapshot = completed(orchestrator(source).trigger_fetch().await);
            assert_eq!(snapshot.phase, FetchPhase::Failure);
            assert_eq!(snapshot.error.as_deref(), Some(message));
            assert_eq!(snapshot.records.len(), 1);
        }
    }

    #[tokio::test]
    async fn test_error_cleared_on_next_success() {
        let failing = orchestrator(CannedSource::respond(503, ""));
        let snapshot = completed(failing.trigger_fetch().await);
        assert!(snapshot.error.is_some());

        // same state holder, new trigger: error must not leak forward
        let orch = Orchestrator {
            source: Arc::new(CannedSource::respond(200, r#"{"p":"1000"}"#)),
            options: NormalizeOptions::default(),
            state: RwLock::new(snapshot),
            in_flight: AtomicBool::new(false),
        };
        let snapshot = completed(orch.trigger_fetch().await);
        assert_eq!(snapshot.phase, FetchPhase::Success);
        assert_eq!(snapshot.error, None);
        assert_eq!(snapshot.records[0].pressure_max, 1080.0);
    }

    #[tokio::test]
    async fn test_concurrent_trigger_is_rejected() {
        let source = CannedSource::respond(200, r#"{"p":"1000"}"#)
            .with_delay(Duration::from_millis(200));
        let counter = source.request_counter();
        let orch = Arc::new(orchestrator(source));

        let first = tokio::spawn({
            let orch = Arc::clone(&orch);
            async move { orch.trigger_fetch().await }
        });
        while !orch.is_loading() {
            tokio::task::yield_now().await;
        }
        assert_eq!(orch.snapshot().await.phase, FetchPhase::Loading);
        assert_eq!(orch.trigger_fetch().await, TriggerOutcome::AlreadyLoading);

        let snapshot = completed(first.await.unwrap());
        assert_eq!(snapshot.phase, FetchPhase::Success);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(!orch.is_loading());
    }

    #[tokio::test]
    async fn test_set_backend_url() {
        let source = CannedSource::respond(200, r#"{"p":"1000"}"#);
        let orch = orchestrator(source);

        orch.set_backend_url("https://example.org/data").await.unwrap();
        assert_eq!(orch.backend_url().await, "https://example.org/data");
        // reconfiguring does not fetch
        assert_eq!(orch.snapshot().await.phase, FetchPhase::Idle);

        let err = orch.set_backend_url("not a url").await.unwrap_err();
        assert_eq!(err.kind(), "url");
        let err = orch.set_backend_url("ftp://example.org").await.unwrap_err();
        assert_eq!(err.kind(), "url");
        assert_eq!(orch.backend_url().await, "https://example.org/data");
    }

    #[tokio::test]
    async fn test_try_new_validates_backend_url() {
        let source: Arc<dyn ObservationSource> = Arc::new(CannedSource::respond(200, "[]"));
        let options = NormalizeOptions::default();

        let orch = Orchestrator::try_new(Arc::clone(&source), URL, options).unwrap();
        assert_eq!(orch.backend_url().await, URL);

        for bad in ["localhost:8080/data", "not a url", "ftp://example.org", ""] {
            let err = Orchestrator::try_new(Arc::clone(&source), bad, options)
                .err()
                .unwrap();
            assert_eq!(err.kind(), "url", "{bad}");
        }
    }

    #[tokio::test]
    async fn test_explicit_presence_keeps_zero_extremum() {
        let options = NormalizeOptions {
            extremum_presence: ExtremumPresence::Explicit,
        };
        let orch = Orchestrator::new(
            Arc::new(CannedSource::respond(200, r#"{"p":"1000","p_min":0}"#)),
            URL,
            options,
        );
        let snapshot = completed(orch.trigger_fetch().await);
        assert_eq!(snapshot.records[0].pressure_min, 0.0);
        assert_eq!(snapshot.stats.min_pressure, 0.0);
        assert_eq!(orch.options().extremum_presence, ExtremumPresence::Explicit);
    }

    #[test]
    fn test_recover() {
        let options = NormalizeOptions::default();
        let recovered = recover(Err(FetchError::Empty), &options);
        assert_eq!(recovered.error, Some(FetchError::Empty));
        assert_eq!(recovered.dataset, fallback_dataset(&options));
    }
}
