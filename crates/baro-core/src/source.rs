//! Producer-side observation records
//!
//! The archive export is a JSON array in the upper-snake spelling. The
//! source service reads that file once and republishes it in the lower-camel
//! spelling, without the extrema columns. Both shapes are what the
//! normalizer has to reconcile.

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::normalize::{as_integer, as_text};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid dataset JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type DatasetResult<T> = Result<T, DatasetError>;

/// One archive row. Reads `NUTS`/`REF_YEAR`/..., writes `nuts1`/`refYear`/...
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct SourceRecord {
    #[serde(rename(serialize = "nuts1", deserialize = "NUTS"))]
    pub nuts1: Option<String>,

    #[serde(
        rename(serialize = "districtCode", deserialize = "DISTRICT_CODE"),
        deserialize_with = "lenient_integer"
    )]
    pub district_code: i64,

    #[serde(
        rename(serialize = "refYear", deserialize = "REF_YEAR"),
        deserialize_with = "lenient_integer"
    )]
    pub ref_year: i64,

    #[serde(
        rename(serialize = "refDate", deserialize = "REF_DATE"),
        deserialize_with = "lenient_integer"
    )]
    pub ref_date: i64,

    #[serde(
        rename(serialize = "p", deserialize = "P"),
        deserialize_with = "lenient_text"
    )]
    pub p: Option<String>,

    #[serde(
        rename(deserialize = "P_MAX"),
        deserialize_with = "lenient_text",
        skip_serializing
    )]
    pub p_max: Option<String>,

    #[serde(
        rename(deserialize = "P_MIN"),
        deserialize_with = "lenient_text",
        skip_serializing
    )]
    pub p_min: Option<String>,
}

/// Integer column: null reads as 0, numeric strings are coerced
fn lenient_integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(0),
        value => as_integer(&value)
            .ok_or_else(|| de::Error::custom(format!("expected an integer, found {value}"))),
    }
}

/// Text column: numbers keep their JSON spelling (`990.9` -> `"990.9"`)
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        value => as_text(&value)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("expected a string, found {value}"))),
    }
}

/// Load an archive export. Unknown keys are ignored.
pub fn load_source_records<P: AsRef<Path>>(path: P) -> DatasetResult<Vec<SourceRecord>> {
    let text = fs::read_to_string(path.as_ref())?;
    let records: Vec<SourceRecord> = serde_json::from_str(&text)?;
    tracing::info!(
        path = %path.as_ref().display(),
        records = records.len(),
        "source dataset loaded"
    );
    Ok(records)
}
