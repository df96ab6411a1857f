//! Extremum synthesis for producers that report a single reading

use serde_json::Value;

use crate::normalize::as_float;

/// Synthesized maximum sits 8% above the base reading
pub const MAX_FACTOR: f64 = 1.08;

/// Synthesized minimum sits 7% below the base reading
pub const MIN_FACTOR: f64 = 0.93;

/// Round to one decimal place
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Use the provided extremum if any, otherwise derive it from `base`
///
/// A provided value that does not parse as a number becomes 0.
pub fn resolve_extremum(base: f64, provided: Option<&Value>, factor: f64) -> f64 {
    match provided {
        Some(value) => as_float(value).unwrap_or(0.0),
        None => round1(base * factor),
    }
}

/// Returns `(pressure_max, pressure_min)`
///
/// No ordering between the results and `base` is enforced; a producer may
/// send a maximum below its own average.
pub fn synthesize_extrema(base: f64, max: Option<&Value>, min: Option<&Value>) -> (f64, f64) {
    (
        resolve_extremum(base, max, MAX_FACTOR),
        resolve_extremum(base, min, MIN_FACTOR),
    )
}
