//! Managed resource of a CRD kind

use async_trait::async_trait;
use k8s_provider_core::{
    Diagnostic, Diagnostics, ObjectId, Schema,
    value::{from_object, get_path, get_str, plan_requires_replace, to_object},
};
use k8s_provider_crd::{CrdKind, SchemaGenerator, names};
use kube::api::PropagationPolicy;
use serde_json::{Map, Value};

use super::{
    PlanResponse, Resource, SUMMARY_DELETE, SUMMARY_DELETE_TIMEOUT, SUMMARY_GET, SUMMARY_IMPORT,
    SUMMARY_MARSHAL, SUMMARY_PATCH, SUMMARY_UPSERT_TIMEOUT, StateResponse, UnitContext,
    object_id,
};
use crate::client::ObjectTarget;
use crate::wait::{WaitForDelete, WaitForUpsert, wait_for_delete, wait_for_upsert};

/// Attributes that only steer the provider and never reach the object
const PROVIDER_ONLY: &[&str] = &[
    names::FORCE_CONFLICTS,
    names::FIELD_MANAGER,
    names::DELETION_PROPAGATION,
    names::WAIT_FOR_UPSERT,
    names::WAIT_FOR_DELETE,
];

/// Resource managing one object of a CRD kind through server-side apply
pub struct CustomResource {
    kind: CrdKind,
    schema: Schema,
    context: UnitContext,
}

impl CustomResource {
    pub fn new(kind: CrdKind, context: UnitContext) -> Self {
        let schema = SchemaGenerator::resource(&kind);
        Self {
            kind,
            schema,
            context,
        }
    }

    /// Object to send to the API server
    fn build_object(&self, plan: &Value) -> Result<Value, Diagnostics> {
        let fields = to_object(&self.schema.attributes, plan)
            .map_err(|e| Diagnostics::from(Diagnostic::error(SUMMARY_MARSHAL, e.to_string())))?;

        let mut object = Map::new();
        object.insert("apiVersion".to_string(), Value::String(self.kind.api_version()));
        object.insert("kind".to_string(), Value::String(self.kind.kind.clone()));
        for (key, value) in fields {
            object.entry(key).or_insert(value);
        }
        Ok(Value::Object(object))
    }

    /// State from the server's view of the object
    ///
    /// Provider-only attributes are carried over from `config`.
    fn state_from_object(&self, object: &Value, config: &Value, id: &ObjectId) -> Value {
        let empty = Map::new();
        let mut state = from_object(&self.schema.attributes, object.as_object().unwrap_or(&empty));
        if let Value::Object(map) = &mut state {
            for name in PROVIDER_ONLY {
                let value = config.get(*name).cloned().unwrap_or(Value::Null);
                map.insert(name.to_string(), value);
            }
            map.insert(names::ID.to_string(), Value::String(id.to_string()));
        }
        state
    }

    async fn apply(&self, plan: &Value) -> StateResponse {
        let client = match self.context.client() {
            Ok(client) => client,
            Err(diags) => return StateResponse::failed(diags),
        };
        let id = match object_id(plan, self.kind.scope) {
            Ok(id) => id,
            Err(diags) => return StateResponse::failed(diags),
        };
        let object = match self.build_object(plan) {
            Ok(object) => object,
            Err(diags) => return StateResponse::failed(diags),
        };
        let conditions = match WaitForUpsert::list_from_state(plan.get(names::WAIT_FOR_UPSERT)) {
            Ok(conditions) => conditions,
            Err(e) => return StateResponse::failed(Diagnostic::error(SUMMARY_MARSHAL, e.to_string())),
        };

        let target = ObjectTarget::new(&self.kind, id.clone());
        let field_manager =
            get_str(plan, &[names::FIELD_MANAGER]).unwrap_or(self.context.field_manager.as_str());
        let force = get_path(plan, &[names::FORCE_CONFLICTS])
            .and_then(Value::as_bool)
            .unwrap_or(self.context.force_conflicts);

        let applied = match client.apply(&target, &object, field_manager, force).await {
            Ok(applied) => applied,
            Err(e) => {
                let mut detail = e.to_string();
                if e.is_conflict() && !force {
                    detail.push_str(
                        "\n\nAnother field manager owns some of these fields. \
                         Set force_conflicts = true to take ownership.",
                    );
                }
                return StateResponse::failed(Diagnostic::error(SUMMARY_PATCH, detail));
            }
        };
        tracing::info!(object = %target, field_manager, "applied object");

        if conditions.is_empty() {
            return StateResponse::ok(self.state_from_object(&applied, plan, &id));
        }

        match wait_for_upsert(client, &target, &conditions).await {
            Ok(latest) => {
                let object = latest.unwrap_or(applied);
                StateResponse::ok(self.state_from_object(&object, plan, &id))
            }
            Err(e) => {
                // applied objects stay in state even when the wait fails
                let summary = if e.is_timeout() {
                    SUMMARY_UPSERT_TIMEOUT
                } else {
                    SUMMARY_GET
                };
                StateResponse {
                    state: Some(self.state_from_object(&applied, plan, &id)),
                    diagnostics: Diagnostic::error(summary, e.to_string()).into(),
                }
            }
        }
    }
}

fn propagation_policy(value: &str) -> Option<PropagationPolicy> {
    match value {
        "Orphan" => Some(PropagationPolicy::Orphan),
        "Background" => Some(PropagationPolicy::Background),
        "Foreground" => Some(PropagationPolicy::Foreground),
        _ => None,
    }
}

#[async_trait]
impl Resource for CustomResource {
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

    async fn create(&self, plan: &Value) -> StateResponse {
        self.apply(plan).await
    }

    async fn read(&self, state: &Value) -> StateResponse {
        let client = match self.context.client() {
            Ok(client) => client,
            Err(diags) => return StateResponse::failed(diags),
        };
        let id = match object_id(state, self.kind.scope) {
            Ok(id) => id,
            Err(diags) => return StateResponse::failed(diags),
        };
        let target = ObjectTarget::new(&self.kind, id.clone());

        match client.get(&target).await {
            Ok(Some(object)) => StateResponse::ok(self.state_from_object(&object, state, &id)),
            Ok(None) => StateResponse::failed(Diagnostic::error(
                SUMMARY_GET,
                format!("{} not found", target),
            )),
            Err(e) => StateResponse::failed(Diagnostic::error(SUMMARY_GET, e.to_string())),
        }
    }

    async fn update(&self, _prior: &Value, plan: &Value) -> StateResponse {
        self.apply(plan).await
    }

    async fn delete(&self, state: &Value) -> Diagnostics {
        let client = match self.context.client() {
            Ok(client) => client,
            Err(diags) => return diags,
        };
        let id = match object_id(state, self.kind.scope) {
            Ok(id) => id,
            Err(diags) => return diags,
        };
        let propagation = match get_str(state, &[names::DELETION_PROPAGATION]) {
            None => None,
            Some(value) => match propagation_policy(value) {
                Some(policy) => Some(policy),
                None => {
                    return Diagnostic::error(
                        SUMMARY_DELETE,
                        format!("unsupported deletion propagation '{}'", value),
                    )
                    .into();
                }
            },
        };
        let wait = match WaitForDelete::from_state(state.get(names::WAIT_FOR_DELETE)) {
            Ok(wait) => wait,
            Err(e) => return Diagnostic::error(SUMMARY_MARSHAL, e.to_string()).into(),
        };

        let target = ObjectTarget::new(&self.kind, id);
        match client.delete(&target, propagation).await {
            Ok(true) => tracing::info!(object = %target, "deleted object"),
            Ok(false) => {
                tracing::debug!(object = %target, "object already gone");
                return Diagnostics::new();
            }
            Err(e) => return Diagnostic::error(SUMMARY_DELETE, e.to_string()).into(),
        }

        let Some(wait) = wait else {
            return Diagnostics::new();
        };
        match wait_for_delete(client, &target, &wait).await {
            Ok(()) => Diagnostics::new(),
            Err(e) if e.is_timeout() => Diagnostic::error(SUMMARY_DELETE_TIMEOUT, e.to_string()).into(),
            Err(e) => Diagnostic::error(SUMMARY_GET, e.to_string()).into(),
        }
    }

    fn import_state(&self, id: &str) -> StateResponse {
        let id = match ObjectId::parse(id, self.kind.scope) {
            Ok(id) => id,
            Err(e) => return StateResponse::failed(Diagnostic::error(SUMMARY_IMPORT, e.to_string())),
        };

        let mut state = from_object(&self.schema.attributes, &Map::new());
        if let Value::Object(map) = &mut state {
            map.insert(names::ID.to_string(), Value::String(id.to_string()));
            let mut metadata = Map::new();
            metadata.insert(names::NAME.to_string(), Value::String(id.name.clone()));
            if let Some(namespace) = &id.namespace {
                metadata.insert(names::NAMESPACE.to_string(), Value::String(namespace.clone()));
            }
            if let Some(Value::Object(existing)) = map.get_mut(names::METADATA) {
                existing.extend(metadata);
            } else {
                map.insert(names::METADATA.to_string(), Value::Object(metadata));
            }
        }
        StateResponse::ok(state)
    }

    fn modify_plan(&self, prior: &Value, planned: &Value) -> PlanResponse {
        PlanResponse {
            requires_replace: plan_requires_replace(&self.schema, prior, planned),
            diagnostics: Diagnostics::new(),
        }
    }
}
