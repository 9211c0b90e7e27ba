//! Read-only data source of a CRD kind

use async_trait::async_trait;
use k8s_provider_core::{Diagnostic, Diagnostics, Schema, value::from_object};
use k8s_provider_crd::{CrdKind, SchemaGenerator, names};
use serde_json::Value;

use super::{DataSource, SUMMARY_GET, StateResponse, UnitContext, object_id};
use crate::client::ObjectTarget;

/// Data source reading one live object of a CRD kind
pub struct CustomDataSource {
    kind: CrdKind,
    schema: Schema,
    context: UnitContext,
}

impl CustomDataSource {
    pub fn new(kind: CrdKind, context: UnitContext) -> Self {
        let schema = SchemaGenerator::data_source(&kind);
        Self {
            kind,
            schema,
            context,
        }
    }
}

#[async_trait]
impl DataSource for CustomDataSource {
    fn type_name(&self) -> String {
        self.kind.type_name()
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn validate_config(&self, config: &Value) -> Diagnostics {
        let mut diags = k8s_provider_core::value::validate_config(&self.schema, config);
        if let Some(warning) = &self.kind.deprecation_warning {
            diags.add_warning("Deprecated API version", warning.clone());
        }
        diags
    }

    async fn read(&self, config: &Value) -> StateResponse {
        let client = match self.context.client() {
            Ok(client) => client,
            Err(diags) => return StateResponse::failed(diags),
        };
        let id = match object_id(config, self.kind.scope) {
            Ok(id) => id,
            Err(diags) => return StateResponse::failed(diags),
        };
        let target = ObjectTarget::new(&self.kind, id.clone());

        let object = match client.get(&target).await {
            Ok(Some(object)) => object,
            Ok(None) => {
                return StateResponse::failed(Diagnostic::error(
                    SUMMARY_GET,
                    format!("{} not found", target),
                ));
            }
            Err(e) => return StateResponse::failed(Diagnostic::error(SUMMARY_GET, e.to_string())),
        };

        let Some(fields) = object.as_object() else {
            return StateResponse::failed(Diagnostic::error(
                SUMMARY_GET,
                format!("unexpected response for {}: not an object", target),
            ));
        };
        let mut state = from_object(&self.schema.attributes, fields);
        if let Value::Object(map) = &mut state {
            map.insert(names::ID.to_string(), Value::String(id.to_string()));
        }
        StateResponse::ok(state)
    }
}
