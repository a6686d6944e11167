//! # LRS Core
//!
//! Core lab-result summarisation logic for the LRS system.
//!
//! The upstream lab feed re-sends whole test panels, reports `Pending`
//! placeholders ahead of real results, and encodes everything as noisy
//! free text. This crate turns that history into clinician-facing
//! summaries:
//!
//! - [`reconcile::recent_observations`] — one most-relevant cleaned
//!   result per configured observation
//! - [`summary::results_grid`] — recent dates crossed with numeric values
//! - [`culture::parse_culture_report`] — structured organisms and
//!   susceptibilities out of reference-lab culture text
//!
//! **No storage or CLI concerns**: persistence lives behind the
//! [`repository::LabTestRepository`] trait (implemented in `lrs-store`),
//! and wiring belongs to the `lrs` binary.

pub mod clean;
pub mod culture;
pub mod error;
pub mod observations;
pub mod reconcile;
pub mod relevant;
pub mod repository;
pub mod summary;

pub use clean::{
    clean_observation_name, clean_observation_value, clean_reference_range,
    extract_observation_value, is_empty_observation_value,
};
pub use culture::{parse_culture_report, CultureIsolate, CultureReport};
pub use error::{LabError, LabResult};
pub use observations::{datetime_ordered_desc, LabTest, Observation};
pub use reconcile::{
    recent_observations, recent_observations_for_patient, ReconciledObservations,
    ReconciledResult, PENDING_VALUE,
};
pub use relevant::{PanelSpec, RelevantTests};
pub use repository::LabTestRepository;
pub use summary::{results_grid, results_grid_for_patient, ObservationSeries, ResultsGrid};
