#[allow(clippy::single_component_path_imports)]
use serde_yaml;

#[derive(Debug, thiserror::Error)]
pub enum LabError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid name or identifier: {0}")]
    Validation(#[from] lrs_types::TextError),
    #[error("duplicate panel name in relevant tests: {0}")]
    DuplicatePanel(String),
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to read lab data: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write lab data: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to serialize lab tests: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize lab tests: {0}")]
    Deserialization(serde_json::Error),
    #[error("failed to parse relevant tests YAML: {0}")]
    YamlDeserialization(serde_yaml::Error),
}

pub type LabResult<T> = std::result::Result<T, LabError>;
