//! Recent-results grid.
//!
//! A dated matrix for trend display: the last few distinct collection
//! dates across, the configured observations down, numeric values in the
//! cells. Clinicians read this to see whether markers are moving, so
//! values are extracted numerically and non-numeric results show as
//! blank cells rather than noise.

use crate::clean::extract_observation_value;
use crate::error::LabResult;
use crate::observations::{LabTest, Observation};
use crate::relevant::RelevantTests;
use crate::repository::LabTestRepository;
use chrono::{DateTime, Utc};
use lrs_types::PatientId;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// How many distinct collection dates the grid shows.
const RECENT_DATE_WINDOW: usize = 5;

/// How many sightings per observation feed the date buckets.
const PER_OBSERVATION_LIMIT: usize = 5;

/// One observation's row: date string to extracted numeric value.
///
/// A sighted but non-numeric result records as `None` for its date; a
/// date with no sighting has no entry at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationSeries {
    pub name: String,
    pub latest_results: BTreeMap<String, Option<f64>>,
}

/// The grid: every configured observation in declared order, plus the
/// ascending `YYYY-MM-DD` date columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsGrid {
    pub obs_values: Vec<ObservationSeries>,
    pub recent_dates: Vec<String>,
}

/// Builds the recent-results grid for a patient's tests.
///
/// For each configured `(panel, observation)` pair the five most recent
/// sightings (by the parent test's ordering datetime) are bucketed by
/// that datetime; the five most recent distinct buckets become the date
/// columns, ascending. Undated tests cannot be bucketed and are skipped.
/// Every configured observation appears in the output, with an empty
/// series if never sighted.
pub fn results_grid(tests: &[LabTest], relevant: &RelevantTests) -> ResultsGrid {
    let mut dates_to_obs: BTreeMap<DateTime<Utc>, Vec<(&str, &Observation)>> = BTreeMap::new();

    for (panel, observation_names) in relevant.iter() {
        for observation_name in observation_names {
            let mut sightings: Vec<(DateTime<Utc>, &Observation)> = Vec::new();
            for test in tests.iter().filter(|t| t.test_name == panel) {
                let datetime_ordered = match test.datetime_ordered {
                    Some(dt) => dt,
                    None => continue,
                };
                for observation in &test.observations {
                    if observation.observation_name == *observation_name {
                        sightings.push((datetime_ordered, observation));
                    }
                }
            }
            sightings.sort_by(|a, b| b.0.cmp(&a.0));
            for (datetime_ordered, observation) in
                sightings.into_iter().take(PER_OBSERVATION_LIMIT)
            {
                dates_to_obs
                    .entry(datetime_ordered)
                    .or_default()
                    .push((observation_name.as_str(), observation));
            }
        }
    }

    // The most recent buckets, oldest of them first.
    let recent: Vec<DateTime<Utc>> = {
        let mut recent: Vec<DateTime<Utc>> = dates_to_obs
            .keys()
            .rev()
            .take(RECENT_DATE_WINDOW)
            .copied()
            .collect();
        recent.reverse();
        recent
    };

    let mut series: Vec<ObservationSeries> = relevant
        .observation_names()
        .map(|name| ObservationSeries {
            name: name.to_string(),
            latest_results: BTreeMap::new(),
        })
        .collect();

    let mut recent_dates = Vec::with_capacity(recent.len());
    for datetime_ordered in &recent {
        let date_str = datetime_ordered.format("%Y-%m-%d").to_string();
        recent_dates.push(date_str.clone());

        let mut by_name: HashMap<&str, &Observation> = HashMap::new();
        for &(name, observation) in &dates_to_obs[datetime_ordered] {
            by_name.insert(name, observation);
        }
        for entry in series.iter_mut() {
            if let Some(observation) = by_name.get(entry.name.as_str()) {
                let value = observation
                    .observation_value
                    .as_deref()
                    .and_then(extract_observation_value);
                entry.latest_results.insert(date_str.clone(), value);
            }
        }
    }

    ResultsGrid {
        obs_values: series,
        recent_dates,
    }
}

/// Fetches a patient's relevant tests from a repository and builds the
/// grid.
///
/// # Errors
///
/// Propagates the repository's errors unchanged.
pub fn results_grid_for_patient<R: LabTestRepository>(
    repository: &R,
    patient: &PatientId,
    relevant: &RelevantTests,
) -> LabResult<ResultsGrid> {
    let panel_names: Vec<&str> = relevant.panel_names().collect();
    let tests = repository.tests_for_patient(patient, &panel_names)?;
    Ok(results_grid(&tests, relevant))
}
