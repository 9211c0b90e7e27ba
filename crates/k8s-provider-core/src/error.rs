//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("invalid import identifier '{id}': {reason}")]
    InvalidImportId { id: String, reason: String },

    #[error("expected an object for attribute '{path}'")]
    NotAnObject { path: String },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Missing required field: {field}")]
    MissingField { field: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
