//! Error types for k8s-provider-kube

use thiserror::Error;

/// Result type for k8s-provider-kube operations
pub type Result<T> = std::result::Result<T, KubeError>;

/// Errors that can occur during Kubernetes operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KubeError {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    /// Object disappeared while it was expected to exist
    #[error("{target} not found")]
    NotFound { target: String },

    /// Wait loop gave up
    #[error("timed out after {after} waiting for {what} of {target}")]
    Timeout {
        what: String,
        target: String,
        after: String,
    },

    /// Invalid JSONPath expression
    #[error("invalid JSONPath '{expression}': {message}")]
    JsonPath { expression: String, message: String },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Value mapping error
    #[error(transparent)]
    Core(#[from] k8s_provider_core::CoreError),
}

impl From<serde_json::Error> for KubeError {
    fn from(e: serde_json::Error) -> Self {
        KubeError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for KubeError {
    fn from(e: serde_yaml::Error) -> Self {
        KubeError::Serialization(e.to_string())
    }
}

impl KubeError {
    /// Check if this is a Kubernetes 404 Not Found error
    pub fn is_not_found(&self) -> bool {
        match self {
            KubeError::Api(kube::Error::Api(resp)) => resp.code == 404,
            KubeError::NotFound { .. } => true,
            _ => false,
        }
    }

    /// Check if this is a conflict error (409)
    pub fn is_conflict(&self) -> bool {
        matches!(self, KubeError::Api(kube::Error::Api(resp)) if resp.code == 409)
    }

    /// Check if a wait loop timed out
    pub fn is_timeout(&self) -> bool {
        matches!(self, KubeError::Timeout { .. })
    }
}
