//! Text-cleaning rules for the raw lab feed.
//!
//! Upstream values are free text with feed artifacts baked in: trailing
//! runs of dots used to pad display names, and `~` used as an embedded
//! line separator carrying boilerplate repeated across every result of a
//! type.

use regex::Regex;
use std::sync::OnceLock;

static NUMERIC_RE: OnceLock<Regex> = OnceLock::new();

/// Strips the trailing run of dots from an observation name.
///
/// Some feed names pad to a fixed width with dots, e.g.
/// `"Hepatitis B 's'Antigen........"`.
pub fn clean_observation_name(name: &str) -> &str {
    name.trim_end_matches('.')
}

/// Drops everything from the first `~` onward in an observation value.
///
/// `~` is the feed's embedded line separator; the tail is boilerplate
/// repeated in all results of the type, e.g.
/// `"8~Please note: New method effective 10/11/2015"`.
/// A missing value passes through unchanged.
pub fn clean_observation_value(value: Option<&str>) -> Option<String> {
    value.map(|v| match v.find('~') {
        Some(idx) => v[..idx].to_string(),
        None => v.to_string(),
    })
}

/// Strips the square brackets some feeds wrap reference ranges in.
pub fn clean_reference_range(reference_range: &str) -> String {
    reference_range
        .replace(['[', ']'], "")
        .trim()
        .to_string()
}

/// Returns true for values that carry no information.
///
/// Missing values, empty strings, and placeholder strings like `" - "`
/// or `" # "` all count as empty.
pub fn is_empty_observation_value(value: Option<&str>) -> bool {
    match value {
        None => true,
        Some(v) => v
            .trim()
            .trim_matches('-')
            .trim_matches('#')
            .trim()
            .is_empty(),
    }
}

/// Extracts a numeric result from a raw observation value.
///
/// Values sometimes arrive with relational markers (`"<5"`, `">12"`) or
/// trailing feed boilerplate after a `~`. Returns the bare number rounded
/// to 3 decimal places, or `None` for anything non-numeric.
pub fn extract_observation_value(observation_value: &str) -> Option<f64> {
    let re = NUMERIC_RE
        .get_or_init(|| Regex::new(r"^[-0-9][0-9.]*$").expect("numeric pattern is valid"));

    let result = observation_value.trim();
    let result = result.split('~').next().unwrap_or("");
    let result = result.trim_matches('<').trim_matches('>').trim();
    if re.is_match(result) {
        result
            .parse::<f64>()
            .ok()
            .map(|f| (f * 1000.0).round() / 1000.0)
    } else {
        None
    }
}
