//! Lab test and observation records.
//!
//! These are the shapes the upstream lab feed produces: a lab test is one
//! result message for a named panel, owning the individual measured
//! observations. Most fields are optional strings because the feed leaves
//! them blank freely; absence is data, not an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A single named measured value within a lab test panel.
///
/// The parent test's `datetime_ordered` drives reconciliation ordering;
/// the observation's own `observation_datetime` is what summaries report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub observation_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation_datetime: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Observation {
    /// Creates an observation with just the fields every feed row carries.
    pub fn new(
        observation_name: impl Into<String>,
        observation_value: Option<String>,
        observation_datetime: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            observation_name: observation_name.into(),
            observation_value,
            observation_datetime,
            observation_number: None,
            units: None,
            reference_range: None,
            last_updated: None,
        }
    }
}

/// One upstream lab test result: a named panel owning its observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabTest {
    pub test_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime_ordered: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical_info: Option<String>,
    #[serde(default)]
    pub observations: Vec<Observation>,
}

impl LabTest {
    /// Creates a test with the fields reconciliation cares about.
    pub fn new(
        test_name: impl Into<String>,
        datetime_ordered: Option<DateTime<Utc>>,
        observations: Vec<Observation>,
    ) -> Self {
        Self {
            test_name: test_name.into(),
            datetime_ordered,
            site: None,
            status: None,
            test_code: None,
            result_id: None,
            clinical_info: None,
            observations,
        }
    }
}

/// Orders tests most recent first by `datetime_ordered`.
///
/// Undated tests sort after all dated ones; they are never compared as
/// greater. Ties keep their input order under a stable sort.
pub fn datetime_ordered_desc(a: &LabTest, b: &LabTest) -> Ordering {
    match (a.datetime_ordered, b.datetime_ordered) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dated(test_name: &str, dt: Option<DateTime<Utc>>) -> LabTest {
        LabTest::new(test_name, dt, vec![])
    }

    #[test]
    fn test_datetime_ordered_desc_most_recent_first() {
        let earlier = Utc.with_ymd_and_hms(2021, 5, 1, 10, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2021, 5, 2, 10, 0, 0).unwrap();
        let mut tests = vec![dated("A", Some(earlier)), dated("B", Some(later))];
        tests.sort_by(datetime_ordered_desc);
        assert_eq!(tests[0].test_name, "B");
        assert_eq!(tests[1].test_name, "A");
    }

    #[test]
    fn test_datetime_ordered_desc_undated_sorts_last() {
        let dt = Utc.with_ymd_and_hms(2021, 5, 1, 10, 0, 0).unwrap();
        let mut tests = vec![dated("undated", None), dated("dated", Some(dt))];
        tests.sort_by(datetime_ordered_desc);
        assert_eq!(tests[0].test_name, "dated");
        assert_eq!(tests[1].test_name, "undated");
    }

    #[test]
    fn test_lab_test_deserializes_with_missing_optionals() {
        let test: LabTest = serde_json::from_str(
            r#"{"test_name": "FULL BLOOD COUNT", "observations": [{"observation_name": "WBC"}]}"#,
        )
        .unwrap();
        assert_eq!(test.test_name, "FULL BLOOD COUNT");
        assert!(test.datetime_ordered.is_none());
        assert_eq!(test.observations.len(), 1);
        assert!(test.observations[0].observation_value.is_none());
    }
}
