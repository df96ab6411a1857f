//! HTTP source backed by `reqwest`

use crate::{FetchError, FetchResult, ObservationSource, RawResponse};
use reqwest::{header, Client};
use std::time::Duration;
use tracing::{debug, instrument};

pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    /// `timeout` bounds the whole request; expiry is a transport error
    pub fn new(timeout: Duration) -> FetchResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl ObservationSource for HttpSource {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> FetchResult<RawResponse> {
        let resp = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        debug!(status, bytes = body.len(), "backend responded");

        Ok(RawResponse { status, body })
    }
}
