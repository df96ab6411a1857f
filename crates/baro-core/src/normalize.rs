//! Field normalization across producer key conventions
//!
//! Producers spell the same field two ways: the archive export uses
//! upper-snake keys (`NUTS`, `REF_YEAR`, `P_MAX`) and the REST service uses
//! lower-camel keys (`nuts1`, `refYear`, `p_max`). Each canonical field has a
//! fixed, ordered list of candidate keys; the first candidate holding a
//! truthy value wins.

use serde_json::Value;

use crate::label::display_label;
use crate::synth::synthesize_extrema;
use crate::types::{ExtremumPresence, NormalizeOptions, NormalizedRecord, RawRecord};

/// Ordered candidate keys for one canonical field plus its coercion
pub struct FieldRule<T> {
    pub keys: &'static [&'static str],
    pub extract: fn(&Value) -> Option<T>,
}

impl<T: Default> FieldRule<T> {
    /// First candidate whose value is truthy. `None` means the field is absent.
    pub fn pick<'a>(&self, raw: &'a RawRecord) -> Option<&'a Value> {
        self.pick_with(raw, is_truthy)
    }

    /// First candidate accepted by `present`
    pub fn pick_with<'a>(
        &self,
        raw: &'a RawRecord,
        present: impl Fn(&Value) -> bool,
    ) -> Option<&'a Value> {
        self.keys
            .iter()
            .filter_map(|key| raw.get(*key))
            .find(|value| present(*value))
    }

    /// Picked value coerced to `T`, or `T::default()`
    pub fn resolve(&self, raw: &RawRecord) -> T {
        self.pick(raw)
            .and_then(|value| (self.extract)(value))
            .unwrap_or_default()
    }
}

pub const REGION: FieldRule<String> = FieldRule {
    keys: &["nuts1", "NUTS"],
    extract: as_text,
};

pub const DISTRICT_CODE: FieldRule<i64> = FieldRule {
    keys: &["districtCode", "DISTRICT_CODE"],
    extract: as_integer,
};

pub const REF_YEAR: FieldRule<i64> = FieldRule {
    keys: &["refYear", "REF_YEAR"],
    extract: as_integer,
};

pub const REF_DATE: FieldRule<i64> = FieldRule {
    keys: &["refDate", "REF_DATE"],
    extract: as_integer,
};

pub const PRESSURE: FieldRule<f64> = FieldRule {
    keys: &["p", "P"],
    extract: as_float,
};

pub const PRESSURE_MAX: FieldRule<f64> = FieldRule {
    keys: &["p_max", "P_MAX"],
    extract: as_float,
};

pub const PRESSURE_MIN: FieldRule<f64> = FieldRule {
    keys: &["p_min", "P_MIN"],
    extract: as_float,
};

/// Identity fields of a record resolved to canonical names
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IdentityFields {
    pub region: String,
    pub district_code: i64,
    pub ref_year: i64,
    pub ref_date: i64,
}

impl IdentityFields {
    pub fn resolve(raw: &RawRecord) -> Self {
        Self {
            region: REGION.resolve(raw),
            district_code: DISTRICT_CODE.resolve(raw),
            ref_year: REF_YEAR.resolve(raw),
            ref_date: REF_DATE.resolve(raw),
        }
    }
}

/// Normalize one raw value into a canonical record
///
/// Returns `None` for anything that is not a JSON object; callers skip those.
pub fn normalize_record(raw: &Value, options: &NormalizeOptions) -> Option<NormalizedRecord> {
    let Some(raw) = raw.as_object() else {
        tracing::debug!(kind = value_kind(raw), "skipping non-object record");
        return None;
    };

    let identity = IdentityFields::resolve(raw);
    let pressure_avg = PRESSURE.resolve(raw);

    let present = |value: &Value| match options.extremum_presence {
        ExtremumPresence::Truthy => is_truthy(value),
        ExtremumPresence::Explicit => !value.is_null(),
    };
    let (pressure_max, pressure_min) = synthesize_extrema(
        pressure_avg,
        PRESSURE_MAX.pick_with(raw, present),
        PRESSURE_MIN.pick_with(raw, present),
    );

    let display_label = display_label(identity.ref_year, identity.ref_date);

    Some(NormalizedRecord {
        region: identity.region,
        district_code: identity.district_code,
        ref_year: identity.ref_year,
        ref_date: identity.ref_date,
        pressure_avg,
        pressure_max,
        pressure_min,
        display_label,
    })
}

/// Loose truthiness: null, `false`, zero and `""` are falsy
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Integer coercion; fractional input truncates toward zero
pub fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => parse_float_prefix(s).map(|f| f.trunc() as i64),
        _ => None,
    }
}

pub fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_float_prefix(s),
        _ => None,
    }
}

/// Parse the longest leading decimal literal of `s` (`"990.9 hPa"` -> 990.9)
///
/// Leading whitespace is skipped. Returns `None` when no digits lead the
/// string or the literal overflows `f64` (`"1e999"`).
pub fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - int_start;

    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok().filter(|f| f.is_finite())
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
