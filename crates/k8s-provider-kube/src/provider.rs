//! Provider: the catalog of units exposed to Terraform
//!
//! The provider owns the CRD catalog and the settings fixed at configure
//! time. Units are created on demand and share the configured client.

use k8s_provider_core::{Diagnostic, Diagnostics, Schema, value::validate_config};
use k8s_provider_crd::CrdCatalog;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::client::{KubeObjectClient, ObjectClient};
use crate::config::ProviderConfig;
use crate::units::{
    CustomDataSource, CustomResource, DataSource, ManifestDataSource, Resource, UnitContext,
};

/// Every schema the provider serves
#[derive(Debug, Clone, Serialize)]
pub struct ProviderSchema {
    pub provider: Schema,
    pub resources: BTreeMap<String, Schema>,
    pub data_sources: BTreeMap<String, Schema>,
}

/// The provider
pub struct Provider {
    catalog: CrdCatalog,
    config: ProviderConfig,
    context: UnitContext,
}

impl Provider {
    /// Unconfigured provider; live units report offline mode until configured
    pub fn new(catalog: CrdCatalog) -> Self {
        Self {
            catalog,
            config: ProviderConfig::default(),
            context: UnitContext::offline(),
        }
    }

    /// Configure from a provider block value, connecting unless offline
    pub async fn configure(&mut self, config: &Value) -> Diagnostics {
        let mut diags = validate_config(&ProviderConfig::schema(), config);
        if diags.has_error() {
            return diags;
        }
        let config = match ProviderConfig::from_value(config) {
            Ok(config) => config,
            Err(e) => {
                diags.add_error("Invalid provider configuration", e.to_string());
                return diags;
            }
        };

        if config.offline {
            self.configure_with(config, None);
            return diags;
        }

        match config.connect().await {
            Ok(client) => {
                let client: Arc<dyn ObjectClient> = Arc::new(KubeObjectClient::new(client));
                self.configure_with(config, Some(client));
            }
            Err(e) => diags.push(Diagnostic::error(
                "Unable to create Kubernetes client",
                e.to_string(),
            )),
        }
        diags
    }

    /// Configure with an existing client; offline mode drops it
    pub fn configure_with(&mut self, config: ProviderConfig, client: Option<Arc<dyn ObjectClient>>) {
        let client = if config.offline { None } else { client };
        tracing::info!(
            offline = client.is_none(),
            field_manager = %config.field_manager,
            force_conflicts = config.force_conflicts,
            kinds = self.catalog.len(),
            "provider configured"
        );
        self.context = UnitContext {
            client,
            field_manager: config.field_manager.clone(),
            force_conflicts: config.force_conflicts,
        };
        self.config = config;
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn catalog(&self) -> &CrdCatalog {
        &self.catalog
    }

    /// All resources, ordered by type name
    pub fn resources(&self) -> Vec<Box<dyn Resource>> {
        self.catalog
            .kinds()
            .map(|kind| {
                Box::new(CustomResource::new(kind.clone(), self.context.clone()))
                    as Box<dyn Resource>
            })
            .collect()
    }

    /// All data sources, live and manifest, ordered by type name
    pub fn data_sources(&self) -> Vec<Box<dyn DataSource>> {
        let mut units: Vec<Box<dyn DataSource>> = Vec::with_capacity(self.catalog.len() * 2);
        for kind in self.catalog.kinds() {
            units.push(Box::new(CustomDataSource::new(
                kind.clone(),
                self.context.clone(),
            )));
            units.push(Box::new(ManifestDataSource::new(kind.clone())));
        }
        units.sort_by_key(|unit| unit.type_name());
        units
    }

    pub fn resource(&self, type_name: &str) -> Option<Box<dyn Resource>> {
        let kind = self.catalog.get(type_name)?;
        Some(Box::new(CustomResource::new(
            kind.clone(),
            self.context.clone(),
        )))
    }

    /// Live or manifest data source by type name
    pub fn data_source(&self, type_name: &str) -> Option<Box<dyn DataSource>> {
        if let Some(kind) = self.catalog.get(type_name) {
            return Some(Box::new(CustomDataSource::new(
                kind.clone(),
                self.context.clone(),
            )));
        }
        let kind = self.catalog.get_manifest(type_name)?;
        Some(Box::new(ManifestDataSource::new(kind.clone())))
    }

    pub fn schema(&self) -> ProviderSchema {
        ProviderSchema {
            provider: ProviderConfig::schema(),
            resources: self
                .resources()
                .iter()
                .map(|unit| (unit.type_name(), unit.schema().clone()))
                .collect(),
            data_sources: self
                .data_sources()
                .iter()
                .map(|unit| (unit.type_name(), unit.schema().clone()))
                .collect(),
        }
    }
}
