//! Year resolution: derive the fiscal-year directory name from a job id.

use once_cell::sync::Lazy;
use regex::Regex;

/// Year token used when a job id contains no 4-digit run.
pub const UNKNOWN_YEAR: &str = "unknown_year";

static RE_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").unwrap());

/// The first four consecutive digits in `job_id`, or [`UNKNOWN_YEAR`].
///
/// `"tax-2568-1"` → `"2568"`. A longer run contributes its first four
/// digits (`"batch-256801"` → `"2568"`).
pub fn extract_year_from_job_id(job_id: &str) -> String {
    RE_YEAR
        .find(job_id)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| UNKNOWN_YEAR.to_string())
}
