//! # LRS Store
//!
//! Sharded JSON-file persistence for per-patient lab tests.
//!
//! Each patient's tests live in a single JSON document under a two-level
//! sharded directory derived from the patient identifier:
//! `<lab_data_dir>/<s1>/<s2>/<PATIENT_ID>/lab_tests.json`. Sharding
//! keeps directory fan-out sane with large patient counts.
//!
//! The store implements [`lrs_core::LabTestRepository`], the read-only
//! seam the summarising code consumes, plus the write path the ingest
//! tooling uses.

mod store;

pub use store::{FileLabTestStore, LAB_TESTS_FILENAME};
