//! Catalog of CRD kinds served by the provider
//!
//! Every served version of every loaded CRD becomes one `CrdKind`, which in
//! turn backs a resource, a data source and a manifest data source.

use k8s_provider_core::{Scope, manifest_type_name, type_name};
use std::collections::BTreeMap;
use std::path::Path;
use walkdir::WalkDir;

use crate::error::{CrdError, Result};
use crate::parser::CrdParser;
use crate::schema::{CrdSchema, OpenApiSchema};

/// CRDs compiled into the provider
const BUILTIN_CRDS: &[(&str, &str)] = &[
    (
        "certificates.cert-manager.io",
        include_str!("../crds/certificates.cert-manager.io.yaml"),
    ),
    (
        "clusterissuers.cert-manager.io",
        include_str!("../crds/clusterissuers.cert-manager.io.yaml"),
    ),
    (
        "servicemonitors.monitoring.coreos.com",
        include_str!("../crds/servicemonitors.monitoring.coreos.com.yaml"),
    ),
];

/// One served version of a CRD
#[derive(Debug, Clone, PartialEq)]
pub struct CrdKind {
    /// Name of the CRD this kind comes from
    pub crd_name: String,
    pub group: String,
    pub version: String,
    pub kind: String,
    pub plural: String,
    pub scope: Scope,
    /// Description of the root schema
    pub description: Option<String>,
    pub deprecation_warning: Option<String>,
    pub schema: Option<OpenApiSchema>,
}

impl CrdKind {
    /// All served versions of a CRD
    pub fn from_crd(crd: &CrdSchema) -> Vec<Self> {
        crd.served_versions()
            .map(|version| Self {
                crd_name: crd.name.clone(),
                group: crd.group.clone(),
                version: version.name.clone(),
                kind: crd.names.kind.clone(),
                plural: crd.names.plural.clone(),
                scope: crd.scope,
                description: version.schema.as_ref().and_then(|s| s.description.clone()),
                deprecation_warning: version.deprecated.then(|| {
                    version.deprecation_warning.clone().unwrap_or_else(|| {
                        format!("{}/{} {} is deprecated", crd.group, version.name, crd.names.kind)
                    })
                }),
                schema: version.schema.clone(),
            })
            .collect()
    }

    /// `apiVersion` of objects of this kind
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    pub fn type_name(&self) -> String {
        type_name(&self.group, &self.kind, &self.version)
    }

    pub fn manifest_type_name(&self) -> String {
        manifest_type_name(&self.group, &self.kind, &self.version)
    }
}

/// Loaded CRD kinds indexed by Terraform type name
#[derive(Debug, Clone, Default)]
pub struct CrdCatalog {
    kinds: BTreeMap<String, CrdKind>,
}

impl CrdCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog of the CRDs compiled into the provider
    pub fn builtin() -> Result<Self> {
        let mut catalog = Self::new();
        for (name, yaml) in BUILTIN_CRDS {
            let crd = CrdParser::parse(yaml)
                .map_err(|e| CrdError::Invalid(format!("builtin CRD {}: {}", name, e)))?;
            catalog.add(&crd)?;
        }
        Ok(catalog)
    }

    /// Add every served version of a CRD
    ///
    /// Fails when a version maps to a type name that is already taken.
    pub fn add(&mut self, crd: &CrdSchema) -> Result<()> {
        let kinds = CrdKind::from_crd(crd);
        // all versions register or none do
        for kind in &kinds {
            let type_name = kind.type_name();
            if let Some(existing) = self.kinds.get(&type_name) {
                return Err(CrdError::DuplicateType {
                    type_name,
                    first: existing.crd_name.clone(),
                    second: kind.crd_name.clone(),
                });
            }
        }
        for kind in kinds {
            let type_name = kind.type_name();
            tracing::debug!(type_name = %type_name, crd = %kind.crd_name, "registered CRD kind");
            self.kinds.insert(type_name, kind);
        }
        Ok(())
    }

    /// Add every CRD of a (multi-document) YAML stream
    pub fn add_yaml(&mut self, yaml: &str) -> Result<usize> {
        let crds = CrdParser::parse_all(yaml)?;
        for crd in &crds {
            self.add(crd)?;
        }
        Ok(crds.len())
    }

    /// Add every CRD found in `.yaml`, `.yml` and `.json` files below `dir`
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(CrdError::Io {
                path: dir.display().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            });
        }
        let mut loaded = 0;

        let entries = WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| matches!(ext, "yaml" | "yml" | "json"))
            });

        for entry in entries {
            let path = entry.path();
            let content = std::fs::read_to_string(path).map_err(|source| CrdError::Io {
                path: path.display().to_string(),
                source,
            })?;
            let count = self.add_yaml(&content).map_err(|e| match e {
                CrdError::Serialization(msg) => {
                    CrdError::Serialization(format!("{}: {}", path.display(), msg))
                }
                other => other,
            })?;
            tracing::debug!(path = %path.display(), count, "loaded CRD file");
            loaded += count;
        }

        Ok(loaded)
    }

    /// Kind behind a resource or data source type name
    pub fn get(&self, type_name: &str) -> Option<&CrdKind> {
        self.kinds.get(type_name)
    }

    /// Kind behind a manifest data source type name
    pub fn get_manifest(&self, type_name: &str) -> Option<&CrdKind> {
        type_name
            .strip_suffix("_manifest")
            .and_then(|base| self.kinds.get(base))
    }

    /// All kinds, ordered by type name
    pub fn kinds(&self) -> impl Iterator<Item = &CrdKind> {
        self.kinds.values()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}
