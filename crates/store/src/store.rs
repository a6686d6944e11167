//! File-backed lab test storage.

use lrs_core::{datetime_ordered_desc, LabError, LabResult, LabTest, LabTestRepository};
use lrs_types::PatientId;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Name of the per-patient document inside the sharded directory.
pub const LAB_TESTS_FILENAME: &str = "lab_tests.json";

/// Lab test store over sharded per-patient JSON documents.
///
/// Single-writer by design: the ingest tooling is the only writer, and
/// the summarising paths are read-only, so no locking is performed.
#[derive(Clone, Debug)]
pub struct FileLabTestStore {
    lab_data_dir: PathBuf,
}

impl FileLabTestStore {
    /// Creates a store rooted at `lab_data_dir`.
    ///
    /// The directory does not need to exist yet; it is created on first
    /// save.
    pub fn new(lab_data_dir: impl Into<PathBuf>) -> Self {
        Self {
            lab_data_dir: lab_data_dir.into(),
        }
    }

    pub fn lab_data_dir(&self) -> &Path {
        &self.lab_data_dir
    }

    fn patient_file(&self, patient: &PatientId) -> PathBuf {
        patient
            .sharded_dir(&self.lab_data_dir)
            .join(LAB_TESTS_FILENAME)
    }

    /// Loads all stored tests for a patient.
    ///
    /// A patient with no stored document yields an empty vec. A document
    /// that exists but does not parse is an upstream contract violation
    /// and fails fast.
    ///
    /// # Errors
    ///
    /// Returns `LabError::FileRead` for IO failures other than absence,
    /// and `LabError::Deserialization` for malformed documents.
    pub fn load_tests(&self, patient: &PatientId) -> LabResult<Vec<LabTest>> {
        let path = self.patient_file(patient);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(LabError::FileRead(e)),
        };
        serde_json::from_str(&contents).map_err(LabError::Deserialization)
    }

    /// Replaces the patient's stored document with `tests`.
    ///
    /// # Errors
    ///
    /// Returns `LabError::StorageDirCreation`, `LabError::Serialization`
    /// or `LabError::FileWrite` on failure.
    pub fn save_tests(&self, patient: &PatientId, tests: &[LabTest]) -> LabResult<()> {
        let patient_dir = patient.sharded_dir(&self.lab_data_dir);
        fs::create_dir_all(&patient_dir).map_err(LabError::StorageDirCreation)?;

        let json = serde_json::to_string_pretty(tests).map_err(LabError::Serialization)?;
        let path = patient_dir.join(LAB_TESTS_FILENAME);
        fs::write(&path, json).map_err(LabError::FileWrite)?;
        tracing::debug!("saved {} lab tests to {}", tests.len(), path.display());
        Ok(())
    }

    /// Appends tests to the patient's stored document.
    ///
    /// Returns the total number of tests now stored for the patient.
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`load_tests`](Self::load_tests) and
    /// [`save_tests`](Self::save_tests).
    pub fn append_tests(&self, patient: &PatientId, tests: Vec<LabTest>) -> LabResult<usize> {
        let mut stored = self.load_tests(patient)?;
        stored.extend(tests);
        self.save_tests(patient, &stored)?;
        Ok(stored.len())
    }

    /// Lists all patient ids with stored lab data.
    ///
    /// Traverses the two-level sharded directory structure. Leaf
    /// directories whose names do not parse as canonical patient ids are
    /// logged as warnings and skipped rather than failing the scan.
    pub fn list_patients(&self) -> Vec<PatientId> {
        let mut patients = Vec::new();

        let s1_iter = match fs::read_dir(&self.lab_data_dir) {
            Ok(it) => it,
            Err(_) => return patients,
        };
        for s1 in s1_iter.flatten() {
            let s1_path = s1.path();
            if !s1_path.is_dir() {
                continue;
            }

            let s2_iter = match fs::read_dir(&s1_path) {
                Ok(it) => it,
                Err(_) => continue,
            };

            for s2 in s2_iter.flatten() {
                let s2_path = s2.path();
                if !s2_path.is_dir() {
                    continue;
                }

                let id_iter = match fs::read_dir(&s2_path) {
                    Ok(it) => it,
                    Err(_) => continue,
                };

                for id_ent in id_iter.flatten() {
                    let id_path = id_ent.path();
                    if !id_path.is_dir() {
                        continue;
                    }
                    if !id_path.join(LAB_TESTS_FILENAME).is_file() {
                        continue;
                    }

                    let name = id_path
                        .file_name()
                        .and_then(|os| os.to_str())
                        .unwrap_or("");
                    match PatientId::parse(name) {
                        Ok(id) => patients.push(id),
                        Err(_) => {
                            tracing::warn!(
                                "skipping non-canonical patient directory: {}",
                                id_path.display()
                            );
                        }
                    }
                }
            }
        }

        patients.sort();
        patients
    }
}

impl LabTestRepository for FileLabTestStore {
    fn tests_for_patient(
        &self,
        patient: &PatientId,
        panel_names: &[&str],
    ) -> LabResult<Vec<LabTest>> {
        let mut tests = self.load_tests(patient)?;
        tests.retain(|test| panel_names.contains(&test.test_name.as_str()));
        tests.sort_by(datetime_ordered_desc);
        Ok(tests)
    }
}
