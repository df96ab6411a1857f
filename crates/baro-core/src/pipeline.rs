//! Normalize -> synthesize -> label -> aggregate

use serde::Serialize;
use serde_json::Value;

use crate::normalize::normalize_record;
use crate::rollups::summarize;
use crate::types::{NormalizeOptions, NormalizedRecord, StatsSummary};

/// A normalized collection together with its summary
///
/// Only constructed from a non-empty collection, so `stats` is always
/// meaningful.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub records: Vec<NormalizedRecord>,
    pub stats: StatsSummary,
}

impl Dataset {
    /// `None` for an empty collection
    pub fn from_records(records: Vec<NormalizedRecord>) -> Option<Self> {
        let stats = summarize(&records)?;
        Some(Self { records, stats })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Normalize a decoded response body
///
/// An array contributes each element; any other value is treated as a
/// single record. Elements that are not objects are skipped, so the output
/// may be shorter than the input.
pub fn normalize_body(body: &Value, options: &NormalizeOptions) -> Vec<NormalizedRecord> {
    match body {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| normalize_record(item, options))
            .collect(),
        single => normalize_record(single, options).into_iter().collect(),
    }
}

/// Run the full pipeline on a decoded body
pub fn process_body(body: &Value, options: &NormalizeOptions) -> Option<Dataset> {
    Dataset::from_records(normalize_body(body, options))
}
