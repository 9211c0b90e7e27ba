//! Terraform units backed by CRD kinds
//!
//! Every CRD kind yields three units sharing one generated schema tree:
//!
//! | Unit                 | Type name                      | Talks to the API |
//! |----------------------|--------------------------------|------------------|
//! | `CustomResource`     | `k8s_<group>_<kind>_<v>`          | yes              |
//! | `CustomDataSource`   | `k8s_<group>_<kind>_<v>`          | yes              |
//! | `ManifestDataSource` | `k8s_<group>_<kind>_<v>_manifest` | no               |
//!
//! Units never fail with a Rust error: every problem is reported through the
//! `Diagnostics` of the response.

mod data_source;
mod manifest;
mod resource;

pub use data_source::CustomDataSource;
pub use manifest::ManifestDataSource;
pub use resource::CustomResource;

use async_trait::async_trait;
use k8s_provider_core::{
    AttributePath, Diagnostic, Diagnostics, ObjectId, Schema, Scope, value::get_str,
};
use k8s_provider_crd::names;
use serde_json::Value;
use std::sync::Arc;

use crate::client::ObjectClient;

pub const SUMMARY_GET: &str = "Unable to GET resource";
pub const SUMMARY_PATCH: &str = "Unable to PATCH resource";
pub const SUMMARY_DELETE: &str = "Unable to DELETE resource";
pub const SUMMARY_MARSHAL: &str = "Unable to marshal resource";
pub const SUMMARY_RENDER: &str = "Unable to render manifest";
pub const SUMMARY_IMPORT: &str = "Invalid import identifier";
pub const SUMMARY_DELETE_TIMEOUT: &str = "Timed out waiting for deletion";
pub const SUMMARY_UPSERT_TIMEOUT: &str = "Timed out waiting for upsert condition";
pub const SUMMARY_OFFLINE: &str = "Provider in Offline Mode";

/// Diagnostic for live operations attempted without a cluster connection
pub fn offline_diagnostic() -> Diagnostic {
    Diagnostic::error(
        SUMMARY_OFFLINE,
        "The provider is configured with 'offline = true' and cannot reach the \
         Kubernetes API. Only manifest data sources can be used in offline mode.",
    )
}

/// Settings shared by all units, fixed at provider configuration
#[derive(Clone)]
pub struct UnitContext {
    /// `None` in offline mode
    pub client: Option<Arc<dyn ObjectClient>>,
    pub field_manager: String,
    pub force_conflicts: bool,
}

impl UnitContext {
    pub fn offline() -> Self {
        Self {
            client: None,
            field_manager: crate::config::DEFAULT_FIELD_MANAGER.to_string(),
            force_conflicts: false,
        }
    }

    pub fn online(client: Arc<dyn ObjectClient>) -> Self {
        Self {
            client: Some(client),
            ..Self::offline()
        }
    }

    /// The client, or the offline diagnostic
    fn client(&self) -> Result<&dyn ObjectClient, Diagnostics> {
        self.client
            .as_deref()
            .ok_or_else(|| offline_diagnostic().into())
    }
}

/// New state plus diagnostics of a unit operation
#[derive(Debug, Clone, Default)]
pub struct StateResponse {
    /// `None` when the operation failed before producing state
    pub state: Option<Value>,
    pub diagnostics: Diagnostics,
}

impl StateResponse {
    pub fn ok(state: Value) -> Self {
        Self {
            state: Some(state),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn failed(diagnostics: impl Into<Diagnostics>) -> Self {
        Self {
            state: None,
            diagnostics: diagnostics.into(),
        }
    }

    pub fn has_error(&self) -> bool {
        self.diagnostics.has_error()
    }
}

/// Outcome of plan modification
#[derive(Debug, Clone, Default)]
pub struct PlanResponse {
    /// Changed attributes that force replacement
    pub requires_replace: Vec<AttributePath>,
    pub diagnostics: Diagnostics,
}

/// A managed resource
#[async_trait]
pub trait Resource: Send + Sync {
    fn type_name(&self) -> String;

    fn schema(&self) -> &Schema;

    fn validate_config(&self, config: &Value) -> Diagnostics {
        k8s_provider_core::value::validate_config(self.schema(), config)
    }

    async fn create(&self, plan: &Value) -> StateResponse;

    async fn read(&self, state: &Value) -> StateResponse;

    async fn update(&self, prior: &Value, plan: &Value) -> StateResponse;

    async fn delete(&self, state: &Value) -> Diagnostics;

    fn import_state(&self, id: &str) -> StateResponse;

    fn modify_plan(&self, prior: &Value, planned: &Value) -> PlanResponse;
}

/// A read-only data source
#[async_trait]
pub trait DataSource: Send + Sync {
    fn type_name(&self) -> String;

    fn schema(&self) -> &Schema;

    fn validate_config(&self, config: &Value) -> Diagnostics {
        k8s_provider_core::value::validate_config(self.schema(), config)
    }

    async fn read(&self, config: &Value) -> StateResponse;
}

/// Object identity from `metadata.name` and `metadata.namespace`
fn object_id(value: &Value, scope: Scope) -> Result<ObjectId, Diagnostics> {
    let name = get_str(value, &[names::METADATA, names::NAME]).ok_or_else(|| {
        Diagnostics::from(
            Diagnostic::error(
                "Missing object name",
                "The attribute metadata.name must be set to address the object.",
            )
            .at(AttributePath::from_attributes([names::METADATA, names::NAME])),
        )
    })?;

    match scope {
        Scope::Cluster => Ok(ObjectId::cluster(name)),
        Scope::Namespaced => {
            let namespace =
                get_str(value, &[names::METADATA, names::NAMESPACE]).ok_or_else(|| {
                    Diagnostics::from(
                        Diagnostic::error(
                            "Missing object namespace",
                            "The attribute metadata.namespace must be set to address the object.",
                        )
                        .at(AttributePath::from_attributes([
                            names::METADATA,
                            names::NAMESPACE,
                        ])),
                    )
                })?;
            Ok(ObjectId::namespaced(namespace, name))
        }
    }
}
