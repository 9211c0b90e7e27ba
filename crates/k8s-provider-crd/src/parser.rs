//! CRD manifest parsing
//!
//! Manifests are deserialized into the typed `apiextensions.k8s.io/v1`
//! definitions of k8s-openapi, then reduced to the `CrdSchema` model.

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
    CustomResourceDefinition, CustomResourceDefinitionVersion, JSONSchemaProps,
    JSONSchemaPropsOrArray, JSONSchemaPropsOrBool,
};
use k8s_provider_core::Scope;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{CrdError, Result};
use crate::schema::{
    AdditionalProperties, CrdNames, CrdSchema, CrdVersionSchema, OpenApiSchema, PropertyType,
    SchemaProperty,
};

const CRD_KIND: &str = "CustomResourceDefinition";

pub struct CrdParser;

impl CrdParser {
    /// Parse a manifest holding exactly one CRD
    pub fn parse(yaml: &str) -> Result<CrdSchema> {
        let value: Value = serde_yaml::from_str(yaml)?;
        Self::parse_value(&value)
    }

    /// Parse every CRD of a multi-document stream, skipping other kinds
    pub fn parse_all(yaml: &str) -> Result<Vec<CrdSchema>> {
        let mut crds = Vec::new();
        for document in serde_yaml::Deserializer::from_str(yaml) {
            let value = Value::deserialize(document)?;
            if value.get("kind").and_then(Value::as_str) == Some(CRD_KIND) {
                crds.push(Self::parse_value(&value)?);
            }
        }
        Ok(crds)
    }

    pub fn parse_value(value: &Value) -> Result<CrdSchema> {
        match value.get("kind").and_then(Value::as_str) {
            Some(CRD_KIND) => {}
            Some(other) => {
                return Err(CrdError::Invalid(format!("expected {}, got {}", CRD_KIND, other)));
            }
            None => return Err(CrdError::Invalid("manifest has no kind".to_string())),
        }

        let crd = CustomResourceDefinition::deserialize(value)
            .map_err(|e| CrdError::Invalid(e.to_string()))?;
        Self::from_definition(&crd)
    }

    /// Reduce a typed definition, e.g. one read back from a cluster
    pub fn from_definition(crd: &CustomResourceDefinition) -> Result<CrdSchema> {
        let name = crd
            .metadata
            .name
            .clone()
            .ok_or_else(|| CrdError::Invalid("metadata.name is missing".to_string()))?;
        let spec = &crd.spec;
        if spec.names.kind.is_empty() {
            return Err(CrdError::Invalid(format!("{}: spec.names.kind is empty", name)));
        }
        if spec.names.plural.is_empty() {
            return Err(CrdError::Invalid(format!("{}: spec.names.plural is empty", name)));
        }

        let scope = match spec.scope.as_str() {
            "Cluster" => Scope::Cluster,
            "Namespaced" => Scope::Namespaced,
            other => {
                return Err(CrdError::Invalid(format!("{}: unknown scope '{}'", name, other)));
            }
        };

        Ok(CrdSchema {
            name,
            group: spec.group.clone(),
            scope,
            names: CrdNames {
                kind: spec.names.kind.clone(),
                plural: spec.names.plural.clone(),
            },
            versions: spec.versions.iter().map(version_schema).collect(),
        })
    }
}

fn version_schema(version: &CustomResourceDefinitionVersion) -> CrdVersionSchema {
    let schema = version
        .schema
        .as_ref()
        .and_then(|s| s.open_api_v3_schema.as_ref())
        .map(|root| OpenApiSchema {
            description: root.description.clone(),
            properties: properties(root),
            required: root.required.clone().unwrap_or_default(),
        });

    CrdVersionSchema {
        name: version.name.clone(),
        served: version.served,
        storage: version.storage,
        deprecated: version.deprecated.unwrap_or(false),
        deprecation_warning: version.deprecation_warning.clone(),
        schema,
    }
}

fn properties(props: &JSONSchemaProps) -> std::collections::BTreeMap<String, SchemaProperty> {
    props
        .properties
        .iter()
        .flatten()
        .map(|(name, prop)| (name.clone(), property(prop)))
        .collect()
}

fn property(props: &JSONSchemaProps) -> SchemaProperty {
    // tuple-style `items` lists have no single element type
    let items = match &props.items {
        Some(JSONSchemaPropsOrArray::Schema(item)) => Some(Box::new(property(item))),
        _ => None,
    };
    let additional_properties = props.additional_properties.as_ref().map(|ap| match ap {
        JSONSchemaPropsOrBool::Bool(true) => AdditionalProperties::Any,
        JSONSchemaPropsOrBool::Bool(false) => AdditionalProperties::Denied,
        JSONSchemaPropsOrBool::Schema(schema) => {
            AdditionalProperties::Schema(Box::new(property(schema)))
        }
    });

    SchemaProperty {
        type_: PropertyType::from(props.type_.as_deref()),
        description: props.description.clone(),
        enum_values: props
            .enum_
            .as_ref()
            .map(|values| values.iter().map(|v| v.0.clone()).collect()),
        min_length: props.min_length.and_then(|m| u64::try_from(m).ok()),
        properties: props.properties.as_ref().map(|_| properties(props)),
        required: props.required.clone(),
        items,
        additional_properties,
        preserve_unknown_fields: props.x_kubernetes_preserve_unknown_fields.unwrap_or(false),
        embedded_resource: props.x_kubernetes_embedded_resource.unwrap_or(false),
        int_or_string: props.x_kubernetes_int_or_string.unwrap_or(false),
    }
}
