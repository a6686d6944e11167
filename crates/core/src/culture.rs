//! Culture report parsing.
//!
//! Reference-lab culture results arrive as a single observation value
//! with `~` as the line separator, in the shape:
//!
//! ```text
//! 1) Mycobacterium abscessus
//! This is the final reference lab. report
//!
//! 1)
//! Amikacin              S
//! Tobramycin            R
//! ```
//!
//! Numbered lines name organisms; unnumbered lines are comments attached
//! to the organism above them. After a `~~` section break come the
//! susceptibility lines, re-keyed by `<digit>)` markers, each ending in
//! `R` (resistant), `S` (sensitive) or `I` (intermediate). There can be
//! more than one organism, and therefore more than one set of
//! susceptibilities.
//!
//! Checked against TB cultures; check individual tests before applying
//! this to other culture types in case their layouts differ.

use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::OnceLock;

static SECTION_RE: OnceLock<Regex> = OnceLock::new();

/// A single organism isolated in a culture, with its susceptibility
/// panel and the comment lines attached to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CultureIsolate {
    pub organism: String,
    pub sensitivities: Vec<String>,
    pub resistances: Vec<String>,
    pub intermediate: Vec<String>,
    pub comments: String,
}

/// A parsed culture report: isolates in first-sighting order.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct CultureReport {
    pub isolates: Vec<CultureIsolate>,
}

/// Parses a culture observation value into a structured report.
///
/// Returns `None` for values that are not culture reports (anything not
/// starting with `1)`), e.g. plain `"No growth"` results.
pub fn parse_culture_report(observation_value: &str) -> Option<CultureReport> {
    let value = observation_value.trim();
    if !value.starts_with("1)") {
        return None;
    }
    // Reports end in a run of tildes; strip it before sectioning.
    let value = value.trim_end_matches('~');

    let re = SECTION_RE
        .get_or_init(|| Regex::new(r"^(.*)~\s*~(.*)$").expect("section pattern is valid"));

    // The susceptibility section sits after a double tilde (optional
    // whitespace between). Reports without one have no susceptibilities.
    let (organism_section, susceptibility_section) = match re.captures(value) {
        Some(caps) => (
            caps.get(1).map_or("", |m| m.as_str()),
            Some(caps.get(2).map_or("", |m| m.as_str())),
        ),
        None => (value, None),
    };

    let mut organisms: Vec<(char, String)> = Vec::new();
    let mut comments: HashMap<char, Vec<String>> = HashMap::new();
    let mut key: Option<char> = None;
    for line in organism_section.split('~') {
        let line = line.trim();
        let bytes = line.as_bytes();
        if bytes.len() > 1 && bytes[0].is_ascii_digit() && bytes[1] == b')' {
            let marker = bytes[0] as char;
            key = Some(marker);
            let organism = line[2..].trim();
            if !organism.is_empty() {
                match organisms.iter_mut().find(|(k, _)| *k == marker) {
                    Some(entry) => entry.1 = organism.to_string(),
                    None => organisms.push((marker, organism.to_string())),
                }
            }
        } else if let Some(marker) = key {
            // Comments refer to the organism above them.
            comments.entry(marker).or_default().push(line.to_string());
        }
    }

    let mut sensitivities: HashMap<char, Vec<String>> = HashMap::new();
    let mut resistances: HashMap<char, Vec<String>> = HashMap::new();
    let mut intermediates: HashMap<char, Vec<String>> = HashMap::new();
    if let Some(section) = susceptibility_section {
        let mut key: Option<char> = None;
        for line in section.split('~') {
            let line = line.trim();
            let bytes = line.as_bytes();
            if bytes.len() > 1
                && bytes[bytes.len() - 1] == b')'
                && bytes[bytes.len() - 2].is_ascii_digit()
            {
                key = Some(bytes[bytes.len() - 2] as char);
            }
            let marker = match key {
                Some(marker) => marker,
                None => continue,
            };
            if line.ends_with('R') {
                resistances
                    .entry(marker)
                    .or_default()
                    .push(line.trim_end_matches('R').trim().to_string());
            }
            if line.ends_with('S') {
                sensitivities
                    .entry(marker)
                    .or_default()
                    .push(line.trim_end_matches('S').trim().to_string());
            }
            if line.ends_with('I') {
                intermediates
                    .entry(marker)
                    .or_default()
                    .push(line.trim_end_matches('I').trim().to_string());
            }
        }
    }

    let mut isolates = Vec::with_capacity(organisms.len());
    for (marker, organism) in organisms {
        isolates.push(CultureIsolate {
            organism,
            sensitivities: sensitivities.remove(&marker).unwrap_or_default(),
            resistances: resistances.remove(&marker).unwrap_or_default(),
            intermediate: intermediates.remove(&marker).unwrap_or_default(),
            comments: comments.remove(&marker).unwrap_or_default().join("\n"),
        });
    }
    Some(CultureReport { isolates })
}
