//! The read-only seam between summarisation and persistence.

use crate::error::LabResult;
use crate::observations::LabTest;
use lrs_types::PatientId;

/// Read-only access to a patient's stored lab tests.
///
/// This is deliberately the only query the summarising code needs:
/// fetch one patient's tests restricted to a set of panel names, most
/// recent first. Implementations own where the data lives; callers own
/// what to do with it.
pub trait LabTestRepository {
    /// Returns the patient's tests whose `test_name` is one of
    /// `panel_names`, ordered by `datetime_ordered` descending with
    /// undated tests last.
    ///
    /// A patient with no stored tests yields an empty vec, not an error.
    fn tests_for_patient(
        &self,
        patient: &PatientId,
        panel_names: &[&str],
    ) -> LabResult<Vec<LabTest>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observations::{datetime_ordered_desc, Observation};
    use crate::reconcile::recent_observations_for_patient;
    use crate::relevant::RelevantTests;
    use chrono::{TimeZone, Utc};

    /// Minimal in-memory repository for exercising the seam.
    struct InMemoryRepository {
        tests: Vec<LabTest>,
    }

    impl LabTestRepository for InMemoryRepository {
        fn tests_for_patient(
            &self,
            _patient: &PatientId,
            panel_names: &[&str],
        ) -> LabResult<Vec<LabTest>> {
            let mut tests: Vec<LabTest> = self
                .tests
                .iter()
                .filter(|t| panel_names.contains(&t.test_name.as_str()))
                .cloned()
                .collect();
            tests.sort_by(datetime_ordered_desc);
            Ok(tests)
        }
    }

    #[test]
    fn test_summaries_compose_with_a_repository() {
        let dt = Utc.with_ymd_and_hms(2021, 6, 1, 9, 0, 0).unwrap();
        let repository = InMemoryRepository {
            tests: vec![
                LabTest::new(
                    "C REACTIVE PROTEIN",
                    Some(dt),
                    vec![Observation::new(
                        "C Reactive Protein",
                        Some("5".to_string()),
                        Some(dt),
                    )],
                ),
                LabTest::new("UNRELATED PANEL", Some(dt), vec![]),
            ],
        };
        let patient = PatientId::parse("50999877").unwrap();
        let relevant =
            RelevantTests::from_pairs(&[("C REACTIVE PROTEIN", &["C Reactive Protein"])])
                .unwrap();
        let result = recent_observations_for_patient(&repository, &patient, &relevant).unwrap();
        assert_eq!(
            result
                .get("C Reactive Protein")
                .unwrap()
                .observation_value
                .as_deref(),
            Some("5")
        );
    }
}
