//! Mapping between Terraform values and Kubernetes objects
//!
//! Terraform configuration, plan and state values are JSON objects keyed by
//! attribute names, with `null` standing for "unset". The schema decides how
//! each attribute maps onto the Kubernetes object:
//!
//! ```text
//!   Terraform state                      Kubernetes object
//!   { "api_version": null,               { "apiVersion": ...,
//!     "metadata": { "name": "a" },  <=>    "metadata": { "name": "a" },
//!     "spec": { "secret_name": "s" } }     "spec": { "secretName": "s" } }
//! ```
//!
//! Unset attributes are omitted from the object, and fields of the object the
//! schema does not know are dropped on the way back.

use serde_json::{Map, Value};

use crate::diagnostics::{AttributePath, Diagnostics};
use crate::error::{CoreError, Result};
use crate::schema::{Attribute, AttributeKind, Attributes, ElementKind, Schema};

/// Build the Kubernetes object for a Terraform value
pub fn to_object(attributes: &Attributes, state: &Value) -> Result<Map<String, Value>> {
    to_object_at(attributes, state, &AttributePath::root())
}

fn to_object_at(
    attributes: &Attributes,
    state: &Value,
    path: &AttributePath,
) -> Result<Map<String, Value>> {
    let state = state.as_object().ok_or_else(|| CoreError::NotAnObject {
        path: path.to_string(),
    })?;

    let mut object = Map::new();
    for (name, attr) in attributes {
        let Some(json_name) = &attr.json_name else {
            continue;
        };
        let value = match state.get(name) {
            None | Some(Value::Null) => continue,
            Some(v) => v,
        };
        let converted = attribute_to_json(attr, value, &path.attribute(name))?;
        object.insert(json_name.clone(), converted);
    }
    Ok(object)
}

fn attribute_to_json(attr: &Attribute, value: &Value, path: &AttributePath) -> Result<Value> {
    Ok(match &attr.kind {
        AttributeKind::IntOrString => int_or_string_to_json(value),
        AttributeKind::List(ElementKind::IntOrString) => match value {
            Value::Array(items) => Value::Array(items.iter().map(int_or_string_to_json).collect()),
            other => other.clone(),
        },
        AttributeKind::Map(ElementKind::IntOrString) => match value {
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), int_or_string_to_json(v)))
                    .collect(),
            ),
            other => other.clone(),
        },
        AttributeKind::SingleNested(nested) => Value::Object(to_object_at(nested, value, path)?),
        AttributeKind::ListNested(nested) => {
            let items = value.as_array().ok_or_else(|| CoreError::NotAnObject {
                path: path.to_string(),
            })?;
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                out.push(nested_to_json(nested, item, &path.index(i))?);
            }
            Value::Array(out)
        }
        AttributeKind::MapNested(nested) => {
            let entries = value.as_object().ok_or_else(|| CoreError::NotAnObject {
                path: path.to_string(),
            })?;
            let mut out = Map::new();
            for (key, item) in entries {
                out.insert(key.clone(), nested_to_json(nested, item, &path.key(key))?);
            }
            Value::Object(out)
        }
        _ => value.clone(),
    })
}

/// Element of a nested collection; `null` elements pass through as `null`
fn nested_to_json(nested: &Attributes, item: &Value, path: &AttributePath) -> Result<Value> {
    if item.is_null() {
        return Ok(Value::Null);
    }
    Ok(Value::Object(to_object_at(nested, item, path)?))
}

/// Strings become integers only in canonical form, so `"08080"` or `"+80"`
/// read back unchanged
fn int_or_string_to_json(value: &Value) -> Value {
    match value.as_str() {
        Some(s) => match s.parse::<i64>() {
            Ok(i) if i.to_string() == s => Value::from(i),
            _ => value.clone(),
        },
        None => value.clone(),
    }
}

fn int_or_string_from_json(value: &Value) -> Value {
    match value {
        Value::Number(n) => Value::String(n.to_string()),
        other => other.clone(),
    }
}

/// Build a Terraform value from a Kubernetes object
///
/// Every attribute of the schema is present in the result. Attributes without
/// a JSON mapping are `null` and left for the caller to fill.
pub fn from_object(attributes: &Attributes, object: &Map<String, Value>) -> Value {
    let mut state = Map::new();
    for (name, attr) in attributes {
        let value = attr
            .json_name
            .as_ref()
            .and_then(|json_name| object.get(json_name))
            .map(|v| attribute_from_json(attr, v))
            .unwrap_or(Value::Null);
        state.insert(name.clone(), value);
    }
    Value::Object(state)
}

fn attribute_from_json(attr: &Attribute, value: &Value) -> Value {
    if value.is_null() {
        return Value::Null;
    }
    match &attr.kind {
        AttributeKind::IntOrString => int_or_string_from_json(value),
        AttributeKind::List(ElementKind::IntOrString) => match value {
            Value::Array(items) => {
                Value::Array(items.iter().map(int_or_string_from_json).collect())
            }
            _ => Value::Null,
        },
        AttributeKind::Map(ElementKind::IntOrString) => match value {
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), int_or_string_from_json(v)))
                    .collect(),
            ),
            _ => Value::Null,
        },
        AttributeKind::SingleNested(nested) => match value {
            Value::Object(obj) => from_object(nested, obj),
            _ => Value::Null,
        },
        AttributeKind::ListNested(nested) => match value {
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| match item {
                        Value::Object(obj) => from_object(nested, obj),
                        _ => Value::Null,
                    })
                    .collect(),
            ),
            _ => Value::Null,
        },
        AttributeKind::MapNested(nested) => match value {
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, item)| {
                        let v = match item {
                            Value::Object(obj) => from_object(nested, obj),
                            _ => Value::Null,
                        };
                        (k.clone(), v)
                    })
                    .collect(),
            ),
            _ => Value::Null,
        },
        _ => value.clone(),
    }
}

/// Validate a configuration value against a schema
///
/// Reports unknown arguments, missing required attributes, values for
/// read-only attributes, type mismatches and validator failures.
pub fn validate_config(schema: &Schema, config: &Value) -> Diagnostics {
    let mut diags = Diagnostics::new();
    match config {
        Value::Object(obj) => {
            validate_object(&schema.attributes, obj, &AttributePath::root(), &mut diags)
        }
        Value::Null => validate_object(
            &schema.attributes,
            &Map::new(),
            &AttributePath::root(),
            &mut diags,
        ),
        _ => diags.add_error(
            "Invalid Configuration",
            "Configuration must be an object of attributes.",
        ),
    }
    diags
}

fn validate_object(
    attributes: &Attributes,
    obj: &Map<String, Value>,
    path: &AttributePath,
    diags: &mut Diagnostics,
) {
    for key in obj.keys() {
        if !attributes.contains_key(key) {
            diags.add_attribute_error(
                path.attribute(key),
                "Unsupported argument",
                format!("An argument named \"{}\" is not expected here.", key),
            );
        }
    }

    for (name, attr) in attributes {
        let attr_path = path.attribute(name);
        let value = obj.get(name).unwrap_or(&Value::Null);

        if value.is_null() {
            if attr.required {
                match path.last_attribute() {
                    None => diags.add_attribute_error(
                        attr_path,
                        "Missing required argument",
                        format!(
                            "The argument \"{}\" is required, but no definition was found.",
                            name
                        ),
                    ),
                    Some(parent) => diags.add_attribute_error(
                        attr_path,
                        "Incorrect attribute value type",
                        format!(
                            "Inappropriate value for attribute \"{}\": attribute \"{}\" is required.",
                            parent, name
                        ),
                    ),
                }
            }
            continue;
        }

        if !attr.is_configurable() {
            diags.add_attribute_error(
                attr_path,
                "Invalid Configuration for Read-Only Attribute",
                "Cannot set value for this attribute as the provider has marked it as read-only. \
                 Remove the configuration line setting the value.",
            );
            continue;
        }

        if !matches_kind(&attr.kind, value) {
            diags.add_attribute_error(
                attr_path,
                "Incorrect attribute value type",
                format!(
                    "Inappropriate value for attribute \"{}\": {} required.",
                    name,
                    attr.kind.type_name()
                ),
            );
            continue;
        }

        for validator in &attr.validators {
            validator.validate(&attr_path, value, diags);
        }

        match (&attr.kind, value) {
            (AttributeKind::SingleNested(nested), Value::Object(o)) => {
                validate_object(nested, o, &attr_path, diags)
            }
            (AttributeKind::ListNested(nested), Value::Array(items)) => {
                for (i, item) in items.iter().enumerate() {
                    if let Value::Object(o) = item {
                        validate_object(nested, o, &attr_path.index(i), diags);
                    }
                }
            }
            (AttributeKind::MapNested(nested), Value::Object(entries)) => {
                for (key, item) in entries {
                    if let Value::Object(o) = item {
                        validate_object(nested, o, &attr_path.key(key), diags);
                    }
                }
            }
            _ => {}
        }
    }
}

fn matches_element(kind: ElementKind, value: &Value) -> bool {
    match kind {
        _ if value.is_null() => true,
        ElementKind::String => value.is_string(),
        ElementKind::IntOrString => value.is_string() || value.is_i64() || value.is_u64(),
        ElementKind::Bool => value.is_boolean(),
        ElementKind::Int64 => value.is_i64() || value.is_u64(),
        ElementKind::Float64 => value.is_number(),
        ElementKind::Dynamic => true,
    }
}

fn matches_kind(kind: &AttributeKind, value: &Value) -> bool {
    match kind {
        AttributeKind::String => matches_element(ElementKind::String, value),
        AttributeKind::Bool => matches_element(ElementKind::Bool, value),
        AttributeKind::Int64 => matches_element(ElementKind::Int64, value),
        AttributeKind::Float64 => matches_element(ElementKind::Float64, value),
        AttributeKind::IntOrString => matches_element(ElementKind::IntOrString, value),
        AttributeKind::Dynamic => true,
        AttributeKind::List(e) => value
            .as_array()
            .is_some_and(|items| items.iter().all(|v| matches_element(*e, v))),
        AttributeKind::Map(e) => value
            .as_object()
            .is_some_and(|map| map.values().all(|v| matches_element(*e, v))),
        AttributeKind::SingleNested(_) => value.is_object(),
        AttributeKind::ListNested(_) => value
            .as_array()
            .is_some_and(|items| items.iter().all(|v| v.is_object() || v.is_null())),
        AttributeKind::MapNested(_) => value
            .as_object()
            .is_some_and(|map| map.values().all(|v| v.is_object() || v.is_null())),
    }
}

/// Attribute paths flagged `requires_replace` whose value differs between
/// prior state and planned state
pub fn plan_requires_replace(schema: &Schema, prior: &Value, planned: &Value) -> Vec<AttributePath> {
    let mut paths = Vec::new();
    if prior.is_null() {
        return paths;
    }
    collect_replacements(
        &schema.attributes,
        prior,
        planned,
        &AttributePath::root(),
        &mut paths,
    );
    paths
}

fn collect_replacements(
    attributes: &Attributes,
    prior: &Value,
    planned: &Value,
    path: &AttributePath,
    paths: &mut Vec<AttributePath>,
) {
    for (name, attr) in attributes {
        let before = prior.get(name).unwrap_or(&Value::Null);
        let after = planned.get(name).unwrap_or(&Value::Null);
        let attr_path = path.attribute(name);

        if attr.requires_replace && before != after {
            paths.push(attr_path.clone());
        }
        if let AttributeKind::SingleNested(nested) = &attr.kind {
            collect_replacements(nested, before, after, &attr_path, paths);
        }
    }
}

/// Look up a nested value by attribute names
pub fn get_path<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(value, |current, name| current.get(*name))
        .filter(|v| !v.is_null())
}

/// Look up a nested string by attribute names
pub fn get_str<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    get_path(value, path).and_then(Value::as_str)
}

/// Drop `null` members of objects, recursively
///
/// Used before deserializing a Terraform value into a struct with defaults.
pub fn without_nulls(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), without_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(without_nulls).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::Validator;
    use serde_json::json;

    fn schema() -> Schema {
        let mut metadata = Attributes::new();
        metadata.insert(
            "name".to_string(),
            Attribute::required_string()
                .mapped_to("name")
                .with_validator(Validator::StringLengthAtLeast { min: 1 })
                .requiring_replace(),
        );
        metadata.insert(
            "labels".to_string(),
            Attribute::optional(AttributeKind::Map(ElementKind::String)).mapped_to("labels"),
        );

        let mut port = Attributes::new();
        port.insert(
            "target_port".to_string(),
            Attribute::optional(AttributeKind::IntOrString).mapped_to("targetPort"),
        );
        port.insert(
            "protocol".to_string(),
            Attribute::optional_string().mapped_to("protocol"),
        );

        let mut spec = Attributes::new();
        spec.insert(
            "secret_name".to_string(),
            Attribute::required_string().mapped_to("secretName"),
        );
        spec.insert(
            "replicas".to_string(),
            Attribute::optional(AttributeKind::Int64).mapped_to("replicas"),
        );
        spec.insert(
            "ports".to_string(),
            Attribute::optional(AttributeKind::ListNested(port)).mapped_to("ports"),
        );
        spec.insert(
            "extra".to_string(),
            Attribute::optional(AttributeKind::Dynamic).mapped_to("extra"),
        );

        let mut attrs = Attributes::new();
        attrs.insert("id".to_string(), Attribute::computed_string());
        attrs.insert(
            "api_version".to_string(),
            Attribute::computed_string().mapped_to("apiVersion"),
        );
        attrs.insert(
            "metadata".to_string(),
            Attribute::required_nested(metadata).mapped_to("metadata"),
        );
        attrs.insert(
            "spec".to_string(),
            Attribute::optional_nested(spec).mapped_to("spec"),
        );
        attrs.insert(
            "field_manager".to_string(),
            Attribute::optional_string(),
        );
        Schema::new(attrs)
    }

    #[test]
    fn test_to_object_renames_and_omits_nulls() {
        let state = json!({
            "id": "ns/a",
            "field_manager": "me",
            "metadata": {"name": "a", "labels": null},
            "spec": {
                "secret_name": "tls",
                "replicas": null,
                "ports": [{"target_port": "8080", "protocol": null}, {"target_port": "http"}],
                "extra": {"anyThing": [1, 2]}
            }
        });
        let object = to_object(&schema().attributes, &state).unwrap();
        assert_eq!(
            Value::Object(object),
            json!({
                "metadata": {"name": "a"},
                "spec": {
                    "secretName": "tls",
                    "ports": [{"targetPort": 8080}, {"targetPort": "http"}],
                    "extra": {"anyThing": [1, 2]}
                }
            })
        );
    }

    #[test]
    fn test_int_or_string_keeps_non_canonical_strings() {
        let state = json!({
            "metadata": {"name": "a"},
            "spec": {
                "secret_name": "tls",
                "ports": [
                    {"target_port": "08080"},
                    {"target_port": "+80"},
                    {"target_port": "-0"},
                    {"target_port": "-12"},
                    {"target_port": 443}
                ]
            }
        });
        let object = to_object(&schema().attributes, &state).unwrap();
        assert_eq!(
            object["spec"]["ports"],
            json!([
                {"targetPort": "08080"},
                {"targetPort": "+80"},
                {"targetPort": "-0"},
                {"targetPort": -12},
                {"targetPort": 443}
            ])
        );

        let back = from_object(&schema().attributes, &object);
        let ports: Vec<&Value> = back["spec"]["ports"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| &p["target_port"])
            .collect();
        assert_eq!(ports, [&json!("08080"), &json!("+80"), &json!("-0"), &json!("-12"), &json!("443")]);
    }

    #[test]
    fn test_null_list_elements_validate_and_convert() {
        let config = json!({
            "metadata": {"name": "a"},
            "spec": {"secret_name": "s", "ports": [null, {"target_port": "http"}]}
        });
        assert!(!validate_config(&schema(), &config).has_error());

        let object = to_object(&schema().attributes, &config).unwrap();
        assert_eq!(object["spec"]["ports"], json!([null, {"targetPort": "http"}]));

        let back = from_object(&schema().attributes, &object);
        assert_eq!(back["spec"]["ports"][0], Value::Null);
        assert_eq!(back["spec"]["ports"][1]["target_port"], "http");
    }

    #[test]
    fn test_from_object_fills_full_shape() {
        let object = json!({
            "apiVersion": "example.com/v1",
            "metadata": {"name": "a", "uid": "1234", "resourceVersion": "7"},
            "spec": {"secretName": "tls", "ports": [{"targetPort": 8080}], "unknown": true},
            "status": {"ready": true}
        });
        let state = from_object(&schema().attributes, object.as_object().unwrap());
        assert_eq!(
            state,
            json!({
                "id": null,
                "api_version": "example.com/v1",
                "field_manager": null,
                "metadata": {"name": "a", "labels": null},
                "spec": {
                    "secret_name": "tls",
                    "replicas": null,
                    "ports": [{"target_port": "8080", "protocol": null}],
                    "extra": null
                }
            })
        );
    }

    #[test]
    fn test_to_object_rejects_non_object() {
        let state = json!({"metadata": "oops"});
        let err = to_object(&schema().attributes, &state).unwrap_err();
        assert!(err.to_string().contains("metadata"));
    }

    #[test]
    fn test_missing_name_is_required() {
        let config = json!({"metadata": {}});
        let diags = validate_config(&schema(), &config);
        assert!(diags.has_error());
        assert!(diags.contains("attribute \"name\" is required"));
    }

    #[test]
    fn test_missing_root_attribute() {
        let diags = validate_config(&schema(), &json!({}));
        assert!(diags.contains("The argument \"metadata\" is required"));
    }

    #[test]
    fn test_empty_name_is_too_short() {
        let config = json!({"metadata": {"name": ""}});
        let diags = validate_config(&schema(), &config);
        assert!(diags.contains("string length must be at least 1"));
    }

    #[test]
    fn test_unknown_and_read_only_attributes() {
        let config = json!({"metadata": {"name": "a"}, "id": "x", "bogus": 1});
        let diags = validate_config(&schema(), &config);
        assert!(diags.contains("An argument named \"bogus\" is not expected here."));
        assert!(diags.contains("Invalid Configuration for Read-Only Attribute"));
    }

    #[test]
    fn test_type_mismatch() {
        let config = json!({
            "metadata": {"name": "a", "labels": {"app": 1}},
            "spec": {"secret_name": "s", "replicas": "three"}
        });
        let diags = validate_config(&schema(), &config);
        assert_eq!(diags.errors().count(), 2);
        assert!(diags.contains("Inappropriate value for attribute \"labels\": map of string required."));
        assert!(diags.contains("Inappropriate value for attribute \"replicas\": number required."));
    }

    #[test]
    fn test_nested_list_validation() {
        let config = json!({
            "metadata": {"name": "a"},
            "spec": {"secret_name": "s", "ports": [{"target_port": 80, "nope": true}]}
        });
        let diags = validate_config(&schema(), &config);
        let d = diags.errors().next().unwrap();
        assert_eq!(
            d.attribute.as_ref().unwrap().to_string(),
            "spec.ports[0].nope"
        );
    }

    #[test]
    fn test_plan_requires_replace() {
        let prior = json!({"metadata": {"name": "a"}, "spec": {"secret_name": "s"}});
        let renamed = json!({"metadata": {"name": "b"}, "spec": {"secret_name": "s"}});
        let changed_spec = json!({"metadata": {"name": "a"}, "spec": {"secret_name": "t"}});

        let paths = plan_requires_replace(&schema(), &prior, &renamed);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].to_string(), "metadata.name");
        assert!(plan_requires_replace(&schema(), &prior, &changed_spec).is_empty());
        assert!(plan_requires_replace(&schema(), &Value::Null, &renamed).is_empty());
    }

    #[test]
    fn test_get_str() {
        let v = json!({"metadata": {"name": "a", "namespace": null}});
        assert_eq!(get_str(&v, &["metadata", "name"]), Some("a"));
        assert_eq!(get_str(&v, &["metadata", "namespace"]), None);
        assert_eq!(get_str(&v, &["spec", "x"]), None);
    }

    #[test]
    fn test_without_nulls() {
        let v = json!({"timeout": "10s", "poll_interval": null, "items": [{"a": null, "b": 1}]});
        assert_eq!(
            without_nulls(&v),
            json!({"timeout": "10s", "items": [{"b": 1}]})
        );
    }
}
