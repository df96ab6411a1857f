//! Observation sources and the fetch orchestrator
//!
//! A source performs exactly one request per call and hands back the raw
//! status and body. [`Orchestrator`] decodes that, runs the normalization
//! pipeline, and substitutes the built-in sample dataset on any failure.

pub mod canned;
pub mod http;
pub mod orchestrator;

pub use canned::*;
pub use http::*;
pub use orchestrator::*;

use baro_core::{process_body, Dataset, NormalizeOptions};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("HTTP error! Status: {0}")]
    Status(u16),

    #[error("Backend returned invalid JSON. Check data format.")]
    InvalidJson { detail: String },

    #[error("No data returned from backend")]
    Empty,

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Short tag for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "transport",
            FetchError::Status(_) => "status",
            FetchError::InvalidJson { .. } => "parse",
            FetchError::Empty => "empty",
            FetchError::InvalidUrl(_) => "url",
        }
    }
}

pub type FetchResult<T> = Result<T, FetchError>;

/// Status and body of one completed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Anything that can answer a single GET for observation data
#[async_trait::async_trait]
pub trait ObservationSource: Send + Sync {
    /// Source name/identifier
    fn name(&self) -> &str;

    /// Issue one request against `url`. Transport failures only; status
    /// codes are the caller's concern.
    async fn fetch(&self, url: &str) -> FetchResult<RawResponse>;
}

/// Status check, JSON decode and pipeline for one response
pub fn decode_response(response: &RawResponse, options: &NormalizeOptions) -> FetchResult<Dataset> {
    if !response.is_success() {
        return Err(FetchError::Status(response.status));
    }
    let body: serde_json::Value =
        serde_json::from_str(&response.body).map_err(|e| FetchError::InvalidJson {
            detail: e.to_string(),
        })?;
    process_body(&body, options).ok_or(FetchError::Empty)
}
