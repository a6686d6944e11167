//! Observation reconciliation.
//!
//! Collapses a patient's raw lab-test history into one most-relevant
//! result per configured observation. The feed re-sends whole panels, so
//! the same observation name recurs across tests; the most recent value
//! wins, except that a `Pending` placeholder gives way to an older real
//! result when one exists.

use crate::clean::{clean_observation_name, clean_observation_value};
use crate::error::LabResult;
use crate::observations::{datetime_ordered_desc, LabTest};
use crate::relevant::RelevantTests;
use crate::repository::LabTestRepository;
use chrono::{DateTime, Utc};
use lrs_types::PatientId;
use serde::ser::SerializeMap;
use serde::Serialize;
use std::collections::HashMap;

/// The sentinel the lab feed sends while a result is unreported.
pub const PENDING_VALUE: &str = "Pending";

/// The most relevant recorded result for a single observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciledResult {
    pub observation_value: Option<String>,
    pub observation_datetime: Option<DateTime<Utc>>,
}

/// Reconciled per-observation results.
///
/// Iteration order follows the declared order of the [`RelevantTests`]
/// mapping the results were built from — panel order, then observation
/// order within each panel — not the chronological order of the source
/// records. Observations never sighted are absent, not null-filled.
///
/// Serialises as a JSON object with keys in that same order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReconciledObservations {
    entries: Vec<(String, ReconciledResult)>,
}

impl ReconciledObservations {
    /// Looks up a result by cleaned observation name.
    pub fn get(&self, name: &str) -> Option<&ReconciledResult> {
        self.entries
            .iter()
            .find(|(entry_name, _)| entry_name == name)
            .map(|(_, result)| result)
    }

    /// Iterates `(cleaned name, result)` in output order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ReconciledResult)> {
        self.entries
            .iter()
            .map(|(name, result)| (name.as_str(), result))
    }

    /// Iterates cleaned observation names in output order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ReconciledObservations {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, result) in &self.entries {
            map.serialize_entry(name, result)?;
        }
        map.end()
    }
}

/// Reconciles a patient's lab tests against a relevant-tests mapping.
///
/// Walks the tests most recent first (undated tests last) and records the
/// first sighting of each wanted observation name. A recorded `Pending`
/// value is overwritten by the next older sighting's cleaned value and
/// datetime; a recorded real value is final. Output keys are cleaned
/// names in the mapping's declared order; unsighted names are omitted.
pub fn recent_observations(
    tests: &[LabTest],
    relevant: &RelevantTests,
) -> ReconciledObservations {
    let mut filtered: Vec<&LabTest> = tests
        .iter()
        .filter(|test| relevant.contains_panel(&test.test_name))
        .collect();
    filtered.sort_by(|a, b| datetime_ordered_desc(a, b));

    let mut by_observation: HashMap<&str, ReconciledResult> = HashMap::new();
    for test in filtered {
        let wanted = match relevant.observations_for(&test.test_name) {
            Some(wanted) => wanted,
            None => continue,
        };
        for observation in &test.observations {
            let name = observation.observation_name.as_str();
            if !wanted.iter().any(|w| w == name) {
                continue;
            }
            let recorded_pending = matches!(
                by_observation.get(name),
                Some(result) if result.observation_value.as_deref() == Some(PENDING_VALUE)
            );
            if !by_observation.contains_key(name) || recorded_pending {
                by_observation.insert(
                    name,
                    ReconciledResult {
                        observation_value: clean_observation_value(
                            observation.observation_value.as_deref(),
                        ),
                        observation_datetime: observation.observation_datetime,
                    },
                );
            }
        }
    }

    let mut entries = Vec::new();
    for (_, observation_names) in relevant.iter() {
        for name in observation_names {
            if let Some(result) = by_observation.remove(name.as_str()) {
                entries.push((clean_observation_name(name).to_string(), result));
            }
        }
    }
    ReconciledObservations { entries }
}

/// Fetches a patient's relevant tests from a repository and reconciles
/// them.
///
/// # Errors
///
/// Propagates the repository's errors unchanged.
pub fn recent_observations_for_patient<R: LabTestRepository>(
    repository: &R,
    patient: &PatientId,
    relevant: &RelevantTests,
) -> LabResult<ReconciledObservations> {
    let panel_names: Vec<&str> = relevant.panel_names().collect();
    let tests = repository.tests_for_patient(patient, &panel_names)?;
    Ok(recent_observations(&tests, relevant))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observations::Observation;
    use chrono::TimeZone;

    fn relevant_one() -> RelevantTests {
        RelevantTests::from_pairs(&[("some_test_name", &["some_obs_name"])]).unwrap()
    }

    fn test_with_obs(
        test_name: &str,
        obs_name: &str,
        obs_value: &str,
        dt: DateTime<Utc>,
    ) -> LabTest {
        LabTest::new(
            test_name,
            Some(dt),
            vec![Observation::new(obs_name, Some(obs_value.to_string()), Some(dt))],
        )
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 6, 2, 10, 30, 0).unwrap()
    }

    fn yesterday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 6, 1, 10, 30, 0).unwrap()
    }

    #[test]
    fn test_ignores_pending_when_older_real_result_exists() {
        let tests = vec![
            test_with_obs("some_test_name", "some_obs_name", "Pending", now()),
            test_with_obs("some_test_name", "some_obs_name", "1", yesterday()),
        ];
        let result = recent_observations(&tests, &relevant_one());
        let entry = result.get("some_obs_name").unwrap();
        assert_eq!(entry.observation_value.as_deref(), Some("1"));
        assert_eq!(entry.observation_datetime, Some(yesterday()));
    }

    #[test]
    fn test_does_not_ignore_pending_when_it_is_the_only_result() {
        let tests = vec![test_with_obs(
            "some_test_name",
            "some_obs_name",
            "Pending",
            now(),
        )];
        let result = recent_observations(&tests, &relevant_one());
        let entry = result.get("some_obs_name").unwrap();
        assert_eq!(entry.observation_value.as_deref(), Some("Pending"));
        assert_eq!(entry.observation_datetime, Some(now()));
    }

    #[test]
    fn test_gets_most_recent_of_two_real_results() {
        let tests = vec![
            test_with_obs("some_test_name", "some_obs_name", "2", now()),
            test_with_obs("some_test_name", "some_obs_name", "1", yesterday()),
        ];
        let result = recent_observations(&tests, &relevant_one());
        let entry = result.get("some_obs_name").unwrap();
        assert_eq!(entry.observation_value.as_deref(), Some("2"));
        assert_eq!(entry.observation_datetime, Some(now()));
    }

    #[test]
    fn test_most_recent_wins_regardless_of_input_order() {
        let tests = vec![
            test_with_obs("some_test_name", "some_obs_name", "1", yesterday()),
            test_with_obs("some_test_name", "some_obs_name", "2", now()),
        ];
        let result = recent_observations(&tests, &relevant_one());
        assert_eq!(
            result.get("some_obs_name").unwrap().observation_value.as_deref(),
            Some("2")
        );
    }

    #[test]
    fn test_only_brings_in_stated_lab_tests() {
        let tests = vec![test_with_obs(
            "some_other_test_name",
            "some_obs_name",
            "2",
            now(),
        )];
        let result = recent_observations(&tests, &relevant_one());
        assert!(result.is_empty());
    }

    #[test]
    fn test_only_brings_in_stated_observations() {
        let tests = vec![test_with_obs(
            "some_test_name",
            "some_other_obs_name",
            "2",
            now(),
        )];
        let result = recent_observations(&tests, &relevant_one());
        assert!(result.is_empty());
    }

    #[test]
    fn test_output_follows_declared_panel_order() {
        let relevant = RelevantTests::from_pairs(&[
            ("some_test_name_1", &["some_obs_name_1"]),
            ("some_test_name_2", &["some_obs_name_2"]),
            ("some_test_name_3", &["some_obs_name_3"]),
        ])
        .unwrap();
        let tests = vec![
            test_with_obs("some_test_name_2", "some_obs_name_2", "2", now()),
            test_with_obs("some_test_name_3", "some_obs_name_3", "3", yesterday()),
            test_with_obs("some_test_name_1", "some_obs_name_1", "1", now()),
        ];
        let result = recent_observations(&tests, &relevant);
        let names: Vec<&str> = result.names().collect();
        assert_eq!(
            names,
            vec!["some_obs_name_1", "some_obs_name_2", "some_obs_name_3"]
        );
    }

    #[test]
    fn test_output_follows_declared_observation_order_within_panel() {
        let relevant = RelevantTests::from_pairs(&[(
            "some_test_name_1",
            &["some_obs_name_1", "some_obs_name_2", "some_obs_name_3"],
        )])
        .unwrap();
        let tests = vec![LabTest::new(
            "some_test_name_1",
            Some(now()),
            vec![
                Observation::new("some_obs_name_2", Some("2".to_string()), Some(now())),
                Observation::new("some_obs_name_3", Some("3".to_string()), Some(now())),
                Observation::new("some_obs_name_1", Some("1".to_string()), Some(yesterday())),
            ],
        )];
        let result = recent_observations(&tests, &relevant);
        let names: Vec<&str> = result.names().collect();
        assert_eq!(
            names,
            vec!["some_obs_name_1", "some_obs_name_2", "some_obs_name_3"]
        );
        assert_eq!(
            result.get("some_obs_name_1").unwrap().observation_value.as_deref(),
            Some("1")
        );
    }

    #[test]
    fn test_undated_test_does_not_shadow_dated_result() {
        let mut undated = test_with_obs("some_test_name", "some_obs_name", "9", now());
        undated.datetime_ordered = None;
        let tests = vec![
            undated,
            test_with_obs("some_test_name", "some_obs_name", "1", yesterday()),
        ];
        let result = recent_observations(&tests, &relevant_one());
        assert_eq!(
            result.get("some_obs_name").unwrap().observation_value.as_deref(),
            Some("1")
        );
    }

    #[test]
    fn test_pending_is_overwritten_once_then_final() {
        let earlier = Utc.with_ymd_and_hms(2021, 5, 31, 10, 30, 0).unwrap();
        let tests = vec![
            test_with_obs("some_test_name", "some_obs_name", "Pending", now()),
            test_with_obs("some_test_name", "some_obs_name", "2", yesterday()),
            test_with_obs("some_test_name", "some_obs_name", "1", earlier),
        ];
        let result = recent_observations(&tests, &relevant_one());
        assert_eq!(
            result.get("some_obs_name").unwrap().observation_value.as_deref(),
            Some("2")
        );
    }

    #[test]
    fn test_successive_pendings_give_way_to_oldest_real_result() {
        let earlier = Utc.with_ymd_and_hms(2021, 5, 31, 10, 30, 0).unwrap();
        let tests = vec![
            test_with_obs("some_test_name", "some_obs_name", "Pending", now()),
            test_with_obs("some_test_name", "some_obs_name", "Pending", yesterday()),
            test_with_obs("some_test_name", "some_obs_name", "1", earlier),
        ];
        let result = recent_observations(&tests, &relevant_one());
        let entry = result.get("some_obs_name").unwrap();
        assert_eq!(entry.observation_value.as_deref(), Some("1"));
        assert_eq!(entry.observation_datetime, Some(earlier));
    }

    #[test]
    fn test_values_are_cleaned_of_feed_boilerplate() {
        let relevant = RelevantTests::from_pairs(&[("CRP", &["CRP"])]).unwrap();
        let tests = vec![test_with_obs("CRP", "CRP", "5~note", now())];
        let result = recent_observations(&tests, &relevant);
        let entry = result.get("CRP").unwrap();
        assert_eq!(entry.observation_value.as_deref(), Some("5"));
        assert_eq!(entry.observation_datetime, Some(now()));
    }

    #[test]
    fn test_output_names_are_cleaned_of_trailing_dots() {
        let relevant = RelevantTests::from_pairs(&[(
            "HEPATITIS B SURFACE AG",
            &["Hepatitis B 's'Antigen........"],
        )])
        .unwrap();
        let tests = vec![test_with_obs(
            "HEPATITIS B SURFACE AG",
            "Hepatitis B 's'Antigen........",
            "Negative",
            now(),
        )];
        let result = recent_observations(&tests, &relevant);
        let names: Vec<&str> = result.names().collect();
        assert_eq!(names, vec!["Hepatitis B 's'Antigen"]);
        assert!(result.get("Hepatitis B 's'Antigen").is_some());
    }

    #[test]
    fn test_missing_value_is_recorded_as_missing() {
        let tests = vec![LabTest::new(
            "some_test_name",
            Some(now()),
            vec![Observation::new("some_obs_name", None, Some(now()))],
        )];
        let result = recent_observations(&tests, &relevant_one());
        let entry = result.get("some_obs_name").unwrap();
        assert_eq!(entry.observation_value, None);
    }

    #[test]
    fn test_serialises_as_ordered_map() {
        let relevant = RelevantTests::from_pairs(&[
            ("B PANEL", &["B"]),
            ("A PANEL", &["A"]),
        ])
        .unwrap();
        let tests = vec![
            test_with_obs("A PANEL", "A", "1", now()),
            test_with_obs("B PANEL", "B", "2", now()),
        ];
        let result = recent_observations(&tests, &relevant);
        let json = serde_json::to_string(&result).unwrap();
        let b_at = json.find("\"B\"").unwrap();
        let a_at = json.find("\"A\"").unwrap();
        assert!(b_at < a_at);
        assert!(json.contains("\"observation_value\":\"2\""));
        assert!(json.contains("\"observation_datetime\""));
    }
}
