use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{PipelineError, Result};

/// Flag letters (e, p, b, …) and padding that Eurostat appends to values.
static ANNOTATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-zA-Z\s]+").unwrap());

/// Eurostat's marker for "not available".
pub const MISSING_SENTINEL: &str = ":";

/// 1) Split a `unit,sex,age,region` key into its four trimmed parts.
pub fn split_composite(raw: &str) -> Result<[String; 4]> {
    let parts: Vec<&str> = raw.split(',').collect();
    match parts.as_slice() {
        [unit, sex, age, region] => Ok([
            unit.trim().to_string(),
            sex.trim().to_string(),
            age.trim().to_string(),
            region.trim().to_string(),
        ]),
        _ => Err(PipelineError::parse(format!(
            "composite key `{}` has {} fields, expected 4",
            raw,
            parts.len()
        ))),
    }
}

/// 2) Year label → integer, ignoring any whitespace (`"2019 "` → 2019).
pub fn normalize_year(raw: &str) -> Result<i64> {
    let stripped: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    stripped
        .parse()
        .map_err(|_| PipelineError::parse(format!("year `{}` is not an integer", raw)))
}

/// 3) Value cell → finite float, or `None` when the measurement is missing.
///
/// Annotation letters and whitespace are discarded first, so `"72.3 e"`
/// becomes 72.3 and `": "` becomes the sentinel.
pub fn normalize_value(raw: &str) -> Option<f64> {
    let cleaned = ANNOTATION.replace_all(raw, "");
    if cleaned.is_empty() || cleaned == MISSING_SENTINEL {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
