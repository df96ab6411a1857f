//! Built-in sample dataset shown when the live fetch fails

use serde_json::{json, Value};

use crate::pipeline::{process_body, Dataset};
use crate::types::{NormalizeOptions, StatsSummary};

/// The sample record, in the upper-snake archive spelling
pub fn fallback_body() -> Value {
    json!([
        {
            "NUTS": "AT13",
            "DISTRICT_CODE": 91900,
            "REF_YEAR": 1872,
            "REF_DATE": 187205,
            "P": "990.9",
            "P_MAX": "1003.2",
            "P_MIN": "981.2"
        }
    ])
}

/// The sample record pushed through the regular pipeline
pub fn fallback_dataset(options: &NormalizeOptions) -> Dataset {
    process_body(&fallback_body(), options).unwrap_or_else(|| Dataset {
        records: Vec::new(),
        stats: StatsSummary::empty(),
    })
}
