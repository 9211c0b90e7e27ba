//! CLI error types with exit code handling
//!
//! Every failure of a command ends up as a `CliError`, rendered by miette and
//! mapped to an exit code.

use k8s_provider_crd::CrdError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Configuration rejected by the unit schema
    #[error("Configuration is invalid: {errors} error(s)")]
    #[diagnostic(code(k8s_provider::cli::validation))]
    Validation { errors: usize },

    /// Input file could not be parsed
    #[error("Invalid input: {message}")]
    #[diagnostic(code(k8s_provider::cli::input))]
    Input {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// An operation returned error diagnostics
    #[error("{operation} failed with {errors} error(s)")]
    #[diagnostic(code(k8s_provider::cli::provider))]
    Provider { operation: String, errors: usize },

    /// No unit registered under the given type name
    #[error("Unknown {category} type '{name}'")]
    #[diagnostic(
        code(k8s_provider::cli::unknown_type),
        help("run `k8s-provider types` to list the registered types")
    )]
    UnknownType {
        category: &'static str,
        name: String,
    },

    /// CRD loading failed
    #[error("CRD error: {message}")]
    #[diagnostic(code(k8s_provider::cli::crd))]
    Crd { message: String },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(k8s_provider::cli::io))]
    Io { message: String },

    /// Wrapped error for passthrough (stores the formatted message)
    #[error("{message}")]
    #[diagnostic(code(k8s_provider::cli::error))]
    Other { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Input { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Provider { .. } => exit_codes::PROVIDER_ERROR,
            CliError::UnknownType { .. } => exit_codes::USAGE_ERROR,
            CliError::Crd { .. } => exit_codes::CRD_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
            help: None,
        }
    }

    pub fn input_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    pub fn provider(operation: impl Into<String>, errors: usize) -> Self {
        Self::Provider {
            operation: operation.into(),
            errors,
        }
    }

    pub fn unknown_type(category: &'static str, name: impl Into<String>) -> Self {
        Self::UnknownType {
            category,
            name: name.into(),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<CrdError> for CliError {
    fn from(err: CrdError) -> Self {
        match err {
            CrdError::Io { .. } => CliError::Io {
                message: err.to_string(),
            },
            other => CliError::Crd {
                message: other.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Other {
            message: err.to_string(),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
