//! Import identifiers
//!
//! Cluster-scoped kinds are imported by bare `name`, namespace-scoped kinds by
//! `namespace/name`. The same format is used for the `id` attribute.

use std::fmt;

use crate::error::{CoreError, Result};

/// Whether a kind lives in a namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    #[default]
    Namespaced,
    Cluster,
}

impl Scope {
    pub fn is_namespaced(&self) -> bool {
        matches!(self, Self::Namespaced)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Namespaced => write!(f, "Namespaced"),
            Self::Cluster => write!(f, "Cluster"),
        }
    }
}

/// Parsed object identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectId {
    pub namespace: Option<String>,
    pub name: String,
}

impl ObjectId {
    pub fn namespaced(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            name: name.into(),
        }
    }

    pub fn cluster(name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            name: name.into(),
        }
    }

    /// Parse an import identifier for a kind of the given scope
    pub fn parse(id: &str, scope: Scope) -> Result<Self> {
        let invalid = |reason: &str| CoreError::InvalidImportId {
            id: id.to_string(),
            reason: reason.to_string(),
        };

        match (scope, id.split_once('/')) {
            (Scope::Namespaced, Some((namespace, name))) => {
                if namespace.is_empty() || name.is_empty() {
                    return Err(invalid(
                        "expected <namespace>/<name> with non-empty namespace and name",
                    ));
                }
                if name.contains('/') {
                    return Err(invalid("expected exactly one '/' separator"));
                }
                Ok(Self::namespaced(namespace, name))
            }
            (Scope::Namespaced, None) => Err(invalid(
                "namespaced resources must be imported as <namespace>/<name>",
            )),
            (Scope::Cluster, Some(_)) => Err(invalid(
                "cluster-scoped resources must be imported by <name> only",
            )),
            (Scope::Cluster, None) => {
                if id.is_empty() {
                    return Err(invalid("name must not be empty"));
                }
                Ok(Self::cluster(id))
            }
        }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{}", ns, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}
