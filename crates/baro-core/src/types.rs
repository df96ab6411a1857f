//! Core data types for pressure observations

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Untyped record as delivered by a producer (field name -> value)
pub type RawRecord = Map<String, Value>;

/// Canonical observation record handed to the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRecord {
    /// NUTS region code, empty when the producer sent none
    pub region: String,

    pub district_code: i64,

    pub ref_year: i64,

    /// Year and month concatenated (187205 = May 1872)
    pub ref_date: i64,

    /// Average pressure (hPa)
    pub pressure_avg: f64,

    /// Maximum pressure (hPa), synthesized when absent
    pub pressure_max: f64,

    /// Minimum pressure (hPa), synthesized when absent
    pub pressure_min: f64,

    /// Period label, `"<year>-<month>"` or `"Unknown"`
    pub display_label: String,
}

/// Summary statistics over a normalized collection
///
/// Pressures are stored unrounded and serialized as fixed one-decimal strings
/// (`"990.9"`), which is what dashboard consumers expect. Rounding happens on
/// the stored binary value, so 900.05 (held as 900.0499...) renders as
/// `"900.0"`.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    #[serde(serialize_with = "one_decimal")]
    pub avg_pressure: f64,

    #[serde(serialize_with = "one_decimal")]
    pub max_pressure: f64,

    #[serde(serialize_with = "one_decimal")]
    pub min_pressure: f64,

    pub total_records: usize,
}

impl StatsSummary {
    /// Zeroed summary shown before any dataset exists
    pub fn empty() -> Self {
        Self::default()
    }
}

fn one_decimal<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{value:.1}"))
}

/// How a raw extremum field (`p_max`, `P_MIN`, ...) counts as provided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtremumPresence {
    /// Falsy values (missing, null, 0, "") count as absent and get synthesized.
    /// A genuine zero reading is overwritten.
    #[default]
    Truthy,

    /// Any present non-null value counts as provided.
    Explicit,
}

/// Options threaded through normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NormalizeOptions {
    pub extremum_presence: ExtremumPresence,
}
