//! Canned source that replays a fixed response, for tests and offline runs

use crate::{FetchResult, ObservationSource, RawResponse};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::time::{sleep, Duration};

/// Replays one fixed outcome on every request
pub struct CannedSource {
    outcome: FetchResult<RawResponse>,
    delay: Duration,
    requests: Arc<AtomicUsize>,
}

impl CannedSource {
    pub fn respond(status: u16, body: impl Into<String>) -> Self {
        Self::from_outcome(Ok(RawResponse::new(status, body)))
    }

    pub fn from_outcome(outcome: FetchResult<RawResponse>) -> Self {
        Self {
            outcome,
            delay: Duration::ZERO,
            requests: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Hold every request for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Shared request counter, readable after the source is moved
    pub fn request_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.requests)
    }
}

#[async_trait::async_trait]
impl ObservationSource for CannedSource {
    fn name(&self) -> &str {
        "canned"
    }

    async fn fetch(&self, url: &str) -> FetchResult<RawResponse> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(%url, "canned request");
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
        self.outcome.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FetchError;

    #[tokio::test]
    async fn test_canned_counts_requests() {
        let source = CannedSource::respond(200, "[]");
        let counter = source.request_counter();

        let resp = source.fetch("http://localhost").await.unwrap();
        assert_eq!(resp.status, 200);
        source.fetch("http://localhost").await.unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_canned_transport_error() {
        let source = CannedSource::from_outcome(Err(FetchError::Transport("refused".into())));
        let err = source.fetch("http://localhost").await.unwrap_err();
        assert_eq!(err.kind(), "transport");
    }
}
