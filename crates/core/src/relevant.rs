//! Relevant-tests configuration.
//!
//! An ordered mapping from panel name to the observation names worth
//! surfacing from that panel. Insertion order is significant: it defines
//! the order of summarised output, which is a presentation contract with
//! clinicians, not an artifact of how results arrived.
//!
//! The mapping is an immutable value passed into the summarising code,
//! resolved once at startup — built in code or loaded from a YAML
//! document — never process-wide mutable state.

use crate::error::{LabError, LabResult};
use lrs_types::NonEmptyName;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// One panel's entry in a [`RelevantTests`] mapping.
#[derive(Debug, Clone, Deserialize)]
pub struct PanelSpec {
    /// Upstream test/panel name, exactly as the feed spells it.
    pub panel: String,
    /// Observation names wanted from this panel, in output order.
    pub observations: Vec<String>,
}

/// Ordered panel-name to wanted-observation-names mapping.
#[derive(Debug, Clone)]
pub struct RelevantTests {
    panels: Vec<(String, Vec<String>)>,
}

impl RelevantTests {
    /// Builds a mapping from panel specs, preserving their order.
    ///
    /// # Errors
    ///
    /// Returns `LabError::Validation` if any panel or observation name is
    /// empty, or `LabError::DuplicatePanel` if a panel name repeats.
    pub fn new(entries: Vec<PanelSpec>) -> LabResult<Self> {
        let mut panels: Vec<(String, Vec<String>)> = Vec::with_capacity(entries.len());
        for entry in entries {
            let panel = NonEmptyName::new(&entry.panel)?;
            if panels.iter().any(|(name, _)| name == panel.as_str()) {
                return Err(LabError::DuplicatePanel(panel.as_str().to_string()));
            }
            let mut observations = Vec::with_capacity(entry.observations.len());
            for observation in &entry.observations {
                observations.push(NonEmptyName::new(observation)?.as_str().to_string());
            }
            panels.push((panel.as_str().to_string(), observations));
        }
        Ok(Self { panels })
    }

    /// Builds a mapping from `(panel, observations)` literal pairs.
    pub fn from_pairs(pairs: &[(&str, &[&str])]) -> LabResult<Self> {
        let entries = pairs
            .iter()
            .map(|(panel, observations)| PanelSpec {
                panel: (*panel).to_string(),
                observations: observations.iter().map(|o| (*o).to_string()).collect(),
            })
            .collect();
        Self::new(entries)
    }

    /// Parses a mapping from a YAML sequence of `{panel, observations}`
    /// entries. Sequence order is the output order.
    ///
    /// # Errors
    ///
    /// Returns `LabError::YamlDeserialization` for malformed YAML and the
    /// same validation errors as [`RelevantTests::new`].
    pub fn from_yaml_str(yaml: &str) -> LabResult<Self> {
        let entries: Vec<PanelSpec> =
            serde_yaml::from_str(yaml).map_err(LabError::YamlDeserialization)?;
        Self::new(entries)
    }

    /// Reads and parses a YAML mapping file.
    ///
    /// # Errors
    ///
    /// Returns `LabError::FileRead` if the file cannot be read, plus the
    /// errors of [`RelevantTests::from_yaml_str`].
    pub fn from_yaml_file(path: &Path) -> LabResult<Self> {
        let contents = fs::read_to_string(path).map_err(LabError::FileRead)?;
        Self::from_yaml_str(&contents)
    }

    /// The tuberculosis service's summary panels, as deployed upstream.
    pub fn tb_summary() -> Self {
        Self::from_pairs(&[
            ("AFB : CULTURE", &["TB: Culture Result"]),
            ("TB PCR TEST", &["TB PCR"]),
            ("C REACTIVE PROTEIN", &["C Reactive Protein"]),
            ("LIVER PROFILE", &["ALT", "AST", "Total Bilirubin"]),
            (
                "QUANTIFERON TB GOLD IT",
                &[
                    "QFT IFN gamma result (TB1)",
                    "QFT IFN gamme result (TB2)",
                    "QFT TB interpretation",
                ],
            ),
            ("HEPATITIS B SURFACE AG", &["Hepatitis B 's'Antigen........"]),
            ("HEPATITIS C ANTIBODY", &["Hepatitis C IgG Antibody......"]),
            ("HIV 1 + 2 ANTIBODIES", &["HIV 1 + 2 Antibodies.........."]),
            ("25-OH Vitamin D", &["25-OH Vitamin D"]),
        ])
        .expect("profile literals are valid")
    }

    /// The infection service's summary panels, as deployed upstream.
    pub fn infection_summary() -> Self {
        Self::from_pairs(&[
            ("FULL BLOOD COUNT", &["WBC", "Lymphocytes", "Neutrophils"]),
            ("C REACTIVE PROTEIN", &["C Reactive Protein"]),
            ("LIVER PROFILE", &["ALT", "AST", "Alkaline Phosphatase"]),
        ])
        .expect("profile literals are valid")
    }

    /// Iterates `(panel, observation names)` in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.panels
            .iter()
            .map(|(panel, observations)| (panel.as_str(), observations.as_slice()))
    }

    /// Iterates panel names in declared order.
    pub fn panel_names(&self) -> impl Iterator<Item = &str> {
        self.panels.iter().map(|(panel, _)| panel.as_str())
    }

    /// Iterates all wanted observation names, panel by panel, in declared
    /// order.
    pub fn observation_names(&self) -> impl Iterator<Item = &str> {
        self.panels
            .iter()
            .flat_map(|(_, observations)| observations.iter().map(String::as_str))
    }

    pub fn contains_panel(&self, panel: &str) -> bool {
        self.panels.iter().any(|(name, _)| name == panel)
    }

    /// The wanted observation names for a panel, if it is mapped.
    pub fn observations_for(&self, panel: &str) -> Option<&[String]> {
        self.panels
            .iter()
            .find(|(name, _)| name == panel)
            .map(|(_, observations)| observations.as_slice())
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }
}
