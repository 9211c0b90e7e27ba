//! Error types for CRD handling

use thiserror::Error;

/// Result type for CRD operations
pub type Result<T> = std::result::Result<T, CrdError>;

/// Errors that can occur while loading CRDs
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CrdError {
    /// Manifest is not a usable CRD
    #[error("invalid CRD: {0}")]
    Invalid(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Two CRDs produced the same Terraform type name
    #[error("duplicate type name '{type_name}' (from {first} and {second})")]
    DuplicateType {
        type_name: String,
        first: String,
        second: String,
    },

    /// IO error
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<serde_yaml::Error> for CrdError {
    fn from(e: serde_yaml::Error) -> Self {
        CrdError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for CrdError {
    fn from(e: serde_json::Error) -> Self {
        CrdError::Serialization(e.to_string())
    }
}
