//! Schema generation from CRD OpenAPI trees
//!
//! Each served CRD version yields three schemas:
//!
//! ```text
//!                       ┌──► resource     (live object, full CRUD)
//!   CRD version ────────┼──► data source  (live object, read only, all computed)
//!   openAPIV3Schema     └──► manifest     (offline YAML rendering)
//! ```
//!
//! The OpenAPI tree is mirrored attribute by attribute. Property names become
//! `snake_case` attribute names and keep their original spelling as the
//! attribute's JSON mapping.

use k8s_provider_core::schema::RESERVED_ROOT_NAMES;
use k8s_provider_core::{
    Attribute, AttributeKind, Attributes, ElementKind, Schema, Scope, Validator, to_snake_case,
};
use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::CrdKind;
use crate::schema::{AdditionalProperties, PropertyType, SchemaProperty};

/// Attribute names shared by every generated schema
pub mod names {
    pub const ID: &str = "id";
    pub const API_VERSION: &str = "api_version";
    pub const KIND: &str = "kind";
    pub const METADATA: &str = "metadata";
    pub const NAME: &str = "name";
    pub const NAMESPACE: &str = "namespace";
    pub const LABELS: &str = "labels";
    pub const ANNOTATIONS: &str = "annotations";
    pub const FORCE_CONFLICTS: &str = "force_conflicts";
    pub const FIELD_MANAGER: &str = "field_manager";
    pub const DELETION_PROPAGATION: &str = "deletion_propagation";
    pub const WAIT_FOR_UPSERT: &str = "wait_for_upsert";
    pub const WAIT_FOR_DELETE: &str = "wait_for_delete";
    pub const JSONPATH: &str = "jsonpath";
    pub const VALUE: &str = "value";
    pub const TIMEOUT: &str = "timeout";
    pub const POLL_INTERVAL: &str = "poll_interval";
    pub const YAML: &str = "yaml";
}

/// Root properties handled by the common attributes, never generated
const SKIPPED_ROOT_PROPERTIES: &[&str] = &["apiVersion", "kind", "metadata", "status"];

/// Propagation policies accepted by `deletion_propagation`
pub const PROPAGATION_POLICIES: &[&str] = &["Orphan", "Background", "Foreground"];

/// Which unit variant a schema is generated for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Resource,
    DataSource,
    Manifest,
}

/// Generates schemas for one CRD kind
pub struct SchemaGenerator;

impl SchemaGenerator {
    /// Schema of the managed resource
    pub fn resource(kind: &CrdKind) -> Schema {
        Self::generate(kind, Variant::Resource)
    }

    /// Schema of the read-only data source
    pub fn data_source(kind: &CrdKind) -> Schema {
        Self::generate(kind, Variant::DataSource)
    }

    /// Schema of the offline manifest data source
    pub fn manifest(kind: &CrdKind) -> Schema {
        Self::generate(kind, Variant::Manifest)
    }

    pub fn generate(kind: &CrdKind, variant: Variant) -> Schema {
        let mut attributes = Attributes::new();

        attributes.insert(
            names::ID.to_string(),
            Attribute::computed_string().with_description(match kind.scope {
                Scope::Namespaced => "The unique ID of this object: '<namespace>/<name>'.",
                Scope::Cluster => "The unique ID of this object: '<name>'.",
            }),
        );
        attributes.insert(
            names::METADATA.to_string(),
            Attribute::required_nested(metadata_attributes(kind.scope, variant))
                .mapped_to("metadata")
                .with_description("Data that helps uniquely identify this object."),
        );

        if variant != Variant::Manifest {
            attributes.insert(
                names::API_VERSION.to_string(),
                Attribute::computed_string()
                    .mapped_to("apiVersion")
                    .with_description(
                        "The API group and version of this object, always set by the provider.",
                    ),
            );
            attributes.insert(
                names::KIND.to_string(),
                Attribute::computed_string()
                    .mapped_to("kind")
                    .with_description("The kind of this object, always set by the provider."),
            );
        }

        match variant {
            Variant::Resource => attributes.extend(resource_attributes()),
            Variant::Manifest => {
                attributes.insert(
                    names::YAML.to_string(),
                    Attribute::computed_string()
                        .with_description("The generated manifest in YAML format."),
                );
            }
            Variant::DataSource => {}
        }

        if let Some(openapi) = &kind.schema {
            let root: BTreeMap<String, SchemaProperty> = openapi
                .properties
                .iter()
                .filter(|(name, _)| !SKIPPED_ROOT_PROPERTIES.contains(&name.as_str()))
                .map(|(name, prop)| (name.clone(), prop.clone()))
                .collect();

            let mut taken: BTreeSet<String> = attributes.keys().cloned().collect();
            taken.extend(RESERVED_ROOT_NAMES.iter().map(|n| n.to_string()));

            for (name, attr) in property_attributes(&root, &openapi.required, taken) {
                let attr = if variant == Variant::DataSource {
                    attr.into_computed()
                } else {
                    attr
                };
                attributes.insert(name, attr);
            }
        }

        let description = match (&kind.description, variant) {
            (Some(d), _) => d.clone(),
            (None, Variant::Manifest) => format!("Creates a YAML manifest for a {}.", kind.kind),
            (None, _) => format!("{} ({})", kind.kind, kind.api_version()),
        };

        Schema::new(attributes).with_description(description)
    }
}

fn metadata_attributes(scope: Scope, variant: Variant) -> Attributes {
    let mut attrs = Attributes::new();

    let identity = |description: &str| {
        let attr = Attribute::required_string()
            .with_description(description)
            .with_validator(Validator::StringLengthAtLeast { min: 1 });
        if variant == Variant::Resource {
            attr.requiring_replace()
        } else {
            attr
        }
    };

    attrs.insert(
        names::NAME.to_string(),
        identity("Unique identifier for this object.").mapped_to("name"),
    );
    if scope.is_namespaced() {
        attrs.insert(
            names::NAMESPACE.to_string(),
            identity("The namespace this object lives in.").mapped_to("namespace"),
        );
    }

    let labels = Attribute::optional(AttributeKind::Map(ElementKind::String))
        .mapped_to("labels")
        .with_description(
            "Map of string keys and values that can be used to organize and categorize objects.",
        )
        .with_validator(Validator::Labels);
    let annotations = Attribute::optional(AttributeKind::Map(ElementKind::String))
        .mapped_to("annotations")
        .with_description(
            "Unstructured key value map stored with a resource that may be set by external tools.",
        )
        .with_validator(Validator::Annotations);

    let (labels, annotations) = match variant {
        Variant::DataSource => (labels.into_computed(), annotations.into_computed()),
        _ => (labels, annotations),
    };
    attrs.insert(names::LABELS.to_string(), labels);
    attrs.insert(names::ANNOTATIONS.to_string(), annotations);
    attrs
}

fn duration_attribute(description: &str) -> Attribute {
    Attribute::optional_string()
        .with_description(description)
        .with_validator(Validator::Duration)
}

fn interval_attribute(description: &str) -> Attribute {
    Attribute::optional_string()
        .with_description(description)
        .with_validator(Validator::NonZeroDuration)
}

fn resource_attributes() -> Attributes {
    let mut attrs = Attributes::new();

    attrs.insert(
        names::FORCE_CONFLICTS.to_string(),
        Attribute::optional_bool().with_description(
            "If 'true', server-side apply will force the changes against conflicts. \
             Defaults to the provider setting.",
        ),
    );
    attrs.insert(
        names::FIELD_MANAGER.to_string(),
        Attribute::optional_string()
            .with_description(
                "The name of the manager used to track field ownership. \
                 Defaults to the provider setting.",
            )
            .with_validator(Validator::StringLengthAtLeast { min: 1 }),
    );
    attrs.insert(
        names::DELETION_PROPAGATION.to_string(),
        Attribute::optional_string()
            .with_description(
                "Decides if a deletion will propagate to the dependents of the object, \
                 and how the garbage collector will handle the propagation.",
            )
            .with_validator(Validator::StringOneOf {
                values: PROPAGATION_POLICIES.iter().map(|p| p.to_string()).collect(),
            }),
    );

    let mut upsert = Attributes::new();
    upsert.insert(
        names::JSONPATH.to_string(),
        Attribute::required_string()
            .with_description("Relative JSONPath expression into the object, e.g. '.status.phase'.")
            .with_validator(Validator::StringLengthAtLeast { min: 1 }),
    );
    upsert.insert(
        names::VALUE.to_string(),
        Attribute::required_string().with_description("Value to wait for."),
    );
    upsert.insert(
        names::TIMEOUT.to_string(),
        duration_attribute("The length of time to wait before giving up. Defaults to '30s'."),
    );
    upsert.insert(
        names::POLL_INTERVAL.to_string(),
        interval_attribute("The length of time to wait between polls. Defaults to '5s'."),
    );
    attrs.insert(
        names::WAIT_FOR_UPSERT.to_string(),
        Attribute::optional(AttributeKind::ListNested(upsert)).with_description(
            "Wait after create and update until every JSONPath expression evaluates to its value.",
        ),
    );

    let mut delete = Attributes::new();
    delete.insert(
        names::TIMEOUT.to_string(),
        duration_attribute("The length of time to wait before giving up. Defaults to '30s'."),
    );
    delete.insert(
        names::POLL_INTERVAL.to_string(),
        interval_attribute("The length of time to wait between polls. Defaults to '5s'."),
    );
    attrs.insert(
        names::WAIT_FOR_DELETE.to_string(),
        Attribute::optional_nested(delete)
            .with_description("Wait after delete until the object is removed from the cluster."),
    );

    attrs
}

/// Convert the properties of an object to attributes
fn property_attributes(
    properties: &BTreeMap<String, SchemaProperty>,
    required: &[String],
    mut taken: BTreeSet<String>,
) -> Attributes {
    let mut attrs = Attributes::new();

    for (json_name, prop) in properties {
        let name = unique_name(&to_snake_case(json_name), &mut taken);
        let kind = attribute_kind(prop);
        let mut attr = if required.iter().any(|r| r == json_name) {
            Attribute::required(kind)
        } else {
            Attribute::optional(kind)
        };
        attr = attr.mapped_to(json_name.clone());
        if let Some(description) = &prop.description {
            attr = attr.with_description(description.clone());
        }
        if matches!(attr.kind, AttributeKind::String) {
            if let Some(values) = prop.string_enum() {
                attr = attr.with_validator(Validator::StringOneOf { values });
            }
            if let Some(min) = prop.min_length.filter(|m| *m > 0) {
                attr = attr.with_validator(Validator::StringLengthAtLeast { min: min as usize });
            }
        }
        attrs.insert(name, attr);
    }
    attrs
}

fn unique_name(base: &str, taken: &mut BTreeSet<String>) -> String {
    let mut name = base.to_string();
    let mut n = 2;
    while taken.contains(&name) {
        name = format!("{}_{}", base, n);
        n += 1;
    }
    taken.insert(name.clone());
    name
}

fn nested_attributes(prop: &SchemaProperty) -> Attributes {
    let required = prop.required.clone().unwrap_or_default();
    prop.properties
        .as_ref()
        .map(|p| property_attributes(p, &required, BTreeSet::new()))
        .unwrap_or_default()
}

/// Element kind for list/map members that are not nested objects
fn element_kind(prop: &SchemaProperty) -> Option<ElementKind> {
    if prop.int_or_string {
        return Some(ElementKind::IntOrString);
    }
    if prop.is_free_form() {
        return Some(ElementKind::Dynamic);
    }
    match prop.type_ {
        PropertyType::String => Some(ElementKind::String),
        PropertyType::Integer => Some(ElementKind::Int64),
        PropertyType::Number => Some(ElementKind::Float64),
        PropertyType::Boolean => Some(ElementKind::Bool),
        PropertyType::Object if prop.has_nested_properties() => None,
        _ => Some(ElementKind::Dynamic),
    }
}

fn attribute_kind(prop: &SchemaProperty) -> AttributeKind {
    if prop.int_or_string {
        return AttributeKind::IntOrString;
    }
    if prop.is_free_form() {
        return AttributeKind::Dynamic;
    }

    match prop.type_ {
        PropertyType::String => AttributeKind::String,
        PropertyType::Integer => AttributeKind::Int64,
        PropertyType::Number => AttributeKind::Float64,
        PropertyType::Boolean => AttributeKind::Bool,
        PropertyType::Array => match prop.items.as_deref() {
            Some(item) => match element_kind(item) {
                Some(e) => AttributeKind::List(e),
                None => AttributeKind::ListNested(nested_attributes(item)),
            },
            None => AttributeKind::List(ElementKind::Dynamic),
        },
        PropertyType::Object if prop.has_nested_properties() => {
            AttributeKind::SingleNested(nested_attributes(prop))
        }
        PropertyType::Object => match &prop.additional_properties {
            Some(AdditionalProperties::Schema(value)) => match element_kind(value) {
                Some(e) => AttributeKind::Map(e),
                None => AttributeKind::MapNested(nested_attributes(value)),
            },
            _ => AttributeKind::Dynamic,
        },
        PropertyType::Unspecified => AttributeKind::Dynamic,
    }
}
