//! Period labels derived from the `refYear`/`refDate` pair

/// Label used when the date code carries no month component
pub const UNKNOWN_LABEL: &str = "Unknown";

/// `"<year>-<date code from its 5th character on>"`
///
/// The date code is a YYYYMM integer, so `(1872, 187205)` gives `"1872-05"`.
/// Codes of four characters or fewer give [`UNKNOWN_LABEL`]. This is plain
/// string slicing; consumers match on the exact output.
pub fn display_label(ref_year: i64, ref_date: i64) -> String {
    let date = ref_date.to_string();
    if date.len() > 4 {
        format!("{}-{}", ref_year, &date[4..])
    } else {
        UNKNOWN_LABEL.to_string()
    }
}
