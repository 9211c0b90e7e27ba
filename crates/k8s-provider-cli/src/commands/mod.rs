//! CLI commands

pub mod apply;
pub mod destroy;
pub mod import;
pub mod manifest;
pub mod read;
pub mod schema;
pub mod types;
pub mod validate;

use k8s_provider_core::Diagnostics;
use k8s_provider_crd::CrdCatalog;
use k8s_provider_kube::{DataSource, Provider, Resource};
use serde_json::{Map, Value};
use std::path::Path;

use crate::GlobalArgs;
use crate::display;
use crate::error::{CliError, Result};

/// Builtin CRDs plus every `--crd-dir`
pub fn load_catalog(global: &GlobalArgs) -> Result<CrdCatalog> {
    let mut catalog = CrdCatalog::builtin()?;
    for dir in &global.crd_dirs {
        let added = catalog.load_dir(dir)?;
        tracing::debug!(dir = %dir.display(), added, "loaded CRDs");
    }
    Ok(catalog)
}

/// Provider block from `--config`, overridden by the command-line flags
pub fn provider_config(global: &GlobalArgs) -> Result<Value> {
    let mut config = match &global.config {
        Some(path) => match read_input(path)? {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            _ => {
                return Err(CliError::input(format!(
                    "{}: provider configuration must be a mapping",
                    path.display()
                )));
            }
        },
        None => Map::new(),
    };

    if global.offline {
        config.insert("offline".to_string(), Value::Bool(true));
    }
    if let Some(path) = &global.kubeconfig {
        config.insert(
            "kubeconfig".to_string(),
            Value::String(path.display().to_string()),
        );
    }
    if let Some(context) = &global.context {
        config.insert("context".to_string(), Value::String(context.clone()));
    }
    if let Some(manager) = &global.field_manager {
        config.insert("field_manager".to_string(), Value::String(manager.clone()));
    }
    if global.force_conflicts {
        config.insert("force_conflicts".to_string(), Value::Bool(true));
    }
    Ok(Value::Object(config))
}

/// Provider that never connects, enough for schemas and manifests
pub fn unconfigured_provider(global: &GlobalArgs) -> Result<Provider> {
    Ok(Provider::new(load_catalog(global)?))
}

/// Provider configured from the global arguments, connecting unless offline
pub async fn configured_provider(global: &GlobalArgs) -> Result<Provider> {
    let mut provider = Provider::new(load_catalog(global)?);
    let diags = provider.configure(&provider_config(global)?).await;
    display::check("Provider configuration", &diags)?;
    Ok(provider)
}

/// Parse a YAML or JSON input file
pub fn read_input(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| CliError::Io {
        message: format!("{}: {}", path.display(), e),
    })?;
    serde_yaml::from_str(&content).map_err(|e| {
        CliError::input_with_help(
            format!("{}: {}", path.display(), e),
            "input files are YAML or JSON objects keyed by attribute name",
        )
    })
}

pub fn resource(provider: &Provider, type_name: &str) -> Result<Box<dyn Resource>> {
    provider
        .resource(type_name)
        .ok_or_else(|| CliError::unknown_type("resource", type_name))
}

pub fn data_source(provider: &Provider, type_name: &str) -> Result<Box<dyn DataSource>> {
    provider
        .data_source(type_name)
        .ok_or_else(|| CliError::unknown_type("data source", type_name))
}

/// Print validation diagnostics, failing on errors
pub fn check_config(diags: &Diagnostics) -> Result<()> {
    display::diagnostics(diags);
    let errors = diags.errors().count();
    if errors > 0 {
        return Err(CliError::Validation { errors });
    }
    Ok(())
}
