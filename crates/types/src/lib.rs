//! # LRS Types
//!
//! Small validated text types shared across the LRS workspace.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// The input was not a canonical patient identifier
    #[error("Patient identifier must be 4-32 ASCII alphanumeric characters, got: '{0}'")]
    InvalidPatientId(String),
}

/// A name string that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one
/// non-whitespace character. The input is automatically trimmed of leading
/// and trailing whitespace during construction. Panel and observation names
/// in configuration are validated through this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmptyName(String);

impl NonEmptyName {
    /// Creates a new `NonEmptyName` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the
    /// trimmed result is empty, an error is returned.
    ///
    /// # Arguments
    ///
    /// * `input` - Any type that can be converted to a string reference
    ///
    /// # Returns
    ///
    /// Returns `Ok(NonEmptyName)` if the trimmed input is non-empty,
    /// or `Err(TextError::Empty)` if it's empty or contains only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NonEmptyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyName::new(&s).map_err(serde::de::Error::custom)
    }
}

/// LRS's canonical patient identifier (hospital number).
///
/// A hospital number is 4 to 32 ASCII alphanumeric characters and is stored
/// uppercase. Once constructed, the contained identifier is guaranteed
/// canonical, which keeps storage path derivation consistent across the
/// system.
///
/// # When to use this type
/// Use this wrapper whenever you are:
/// - Accepting a patient identifier from *outside* the core (CLI input,
///   ingest feed, etc), or
/// - Deriving a sharded storage path for a patient's lab data.
///
/// # Construction
/// - [`PatientId::parse`] validates an externally supplied identifier and
///   canonicalises it to uppercase.
///
/// # Display format
/// When displayed or converted to string, `PatientId` always produces the
/// canonical uppercase form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatientId(String);

impl PatientId {
    /// Validates and parses a patient identifier.
    ///
    /// The input is trimmed and canonicalised to uppercase. Identifiers
    /// must be 4 to 32 ASCII alphanumeric characters; anything else is an
    /// upstream data error, not something to coerce.
    ///
    /// # Arguments
    ///
    /// * `input` - Patient identifier string to validate and wrap.
    ///
    /// # Returns
    ///
    /// Returns a validated [`PatientId`] on success.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::InvalidPatientId`] if `input` is not a valid
    /// hospital number.
    pub fn parse(input: &str) -> Result<Self, TextError> {
        let trimmed = input.trim();
        if !Self::is_valid(trimmed) {
            return Err(TextError::InvalidPatientId(input.to_string()));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Returns true if `input` is an acceptable patient identifier.
    ///
    /// This is a purely syntactic check that validates:
    /// - Length between 4 and 32 bytes
    /// - Only ASCII alphanumeric characters
    ///
    /// Case is not checked here; [`parse`](PatientId::parse) canonicalises
    /// to uppercase.
    pub fn is_valid(input: &str) -> bool {
        (4..=32).contains(&input.len()) && input.bytes().all(|b| b.is_ascii_alphanumeric())
    }

    /// Returns the canonical identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `parent_dir/<s1>/<s2>/<ID>/` where `s1`/`s2` are derived
    /// from this identifier.
    ///
    /// This implements LRS's sharding scheme:
    /// - `s1` is the first two characters of the identifier, lowercased
    /// - `s2` is the next two characters, lowercased
    /// - The full canonical (uppercase) identifier forms the leaf directory
    ///
    /// This sharding prevents filesystem performance issues with large
    /// numbers of patient directories in a single location.
    ///
    /// # Arguments
    ///
    /// * `parent_dir` - Base directory under which to shard the identifier.
    ///
    /// # Returns
    ///
    /// Returns the fully qualified sharded directory path for this patient.
    pub fn sharded_dir(&self, parent_dir: &Path) -> PathBuf {
        let lower = self.0.to_ascii_lowercase();
        let s1 = &lower[0..2];
        let s2 = &lower[2..4];
        parent_dir.join(s1).join(s2).join(&self.0)
    }
}

impl fmt::Display for PatientId {
    /// Formats the identifier in canonical (uppercase) form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PatientId {
    type Err = TextError;

    /// Parses a string into a `PatientId`, canonicalising to uppercase.
    ///
    /// This is equivalent to calling [`PatientId::parse`].
    ///
    /// # Errors
    ///
    /// Returns [`TextError::InvalidPatientId`] if the string is not a valid
    /// hospital number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PatientId::parse(s)
    }
}

impl serde::Serialize for PatientId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for PatientId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PatientId::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_name_trims_input() {
        let name = NonEmptyName::new("  C Reactive Protein  ").unwrap();
        assert_eq!(name.as_str(), "C Reactive Protein");
    }

    #[test]
    fn test_non_empty_name_rejects_empty() {
        assert!(matches!(NonEmptyName::new(""), Err(TextError::Empty)));
        assert!(matches!(NonEmptyName::new("   "), Err(TextError::Empty)));
    }

    #[test]
    fn test_non_empty_name_display() {
        let name = NonEmptyName::new("ALT").unwrap();
        assert_eq!(name.to_string(), "ALT");
    }

    #[test]
    fn test_patient_id_canonicalises_to_uppercase() {
        let id = PatientId::parse("abc123").unwrap();
        assert_eq!(id.as_str(), "ABC123");
    }

    #[test]
    fn test_patient_id_trims_whitespace() {
        let id = PatientId::parse(" 50999877 ").unwrap();
        assert_eq!(id.as_str(), "50999877");
    }

    #[test]
    fn test_patient_id_rejects_too_short() {
        assert!(PatientId::parse("123").is_err());
    }

    #[test]
    fn test_patient_id_rejects_too_long() {
        let long = "A".repeat(33);
        assert!(PatientId::parse(&long).is_err());
    }

    #[test]
    fn test_patient_id_rejects_non_alphanumeric() {
        assert!(PatientId::parse("1234-5678").is_err());
        assert!(PatientId::parse("12 345").is_err());
        assert!(PatientId::parse("").is_err());
    }

    #[test]
    fn test_patient_id_error_reports_input() {
        match PatientId::parse("no/slash") {
            Err(TextError::InvalidPatientId(msg)) => assert_eq!(msg, "no/slash"),
            other => panic!("expected InvalidPatientId, got {:?}", other),
        }
    }

    #[test]
    fn test_sharded_dir_structure() {
        let id = PatientId::parse("50999877").unwrap();
        let parent = Path::new("/lab_data");
        assert_eq!(
            id.sharded_dir(parent),
            PathBuf::from("/lab_data/50/99/50999877")
        );
    }

    #[test]
    fn test_sharded_dir_lowercases_shards() {
        let id = PatientId::parse("AB12CD").unwrap();
        let parent = Path::new("/lab_data");
        assert_eq!(
            id.sharded_dir(parent),
            PathBuf::from("/lab_data/ab/12/AB12CD")
        );
    }

    #[test]
    fn test_from_str_round_trip() {
        let id: PatientId = "50999877".parse().unwrap();
        assert_eq!(id.to_string(), "50999877");
    }
}
