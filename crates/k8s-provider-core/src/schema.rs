//! Schema descriptors for resources and data sources
//!
//! A [`Schema`] is a declarative attribute tree consumed by Terraform to
//! validate configuration and drive plan/state diffing. It carries no
//! behavior: construction is infallible and deterministic, and the same tree
//! also drives the mapping between Terraform values and Kubernetes JSON (see
//! [`crate::value`]).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::diagnostics::{AttributePath, Diagnostics};
use crate::validators::Validator;

/// Nested attributes of an object
pub type Attributes = BTreeMap<String, Attribute>;

/// Names Terraform reserves at the root of a resource or data source
pub const RESERVED_ROOT_NAMES: &[&str] = &[
    "connection",
    "count",
    "depends_on",
    "for_each",
    "lifecycle",
    "provider",
    "provisioner",
];

static ATTRIBUTE_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_]*$").unwrap());

/// Element type of a primitive list or map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    String,
    Bool,
    Int64,
    Float64,
    /// Stored as a string in Terraform, sent as integer when it parses as one
    IntOrString,
    /// Arbitrary JSON value, passed through untouched
    Dynamic,
}

impl ElementKind {
    /// Human-readable type name used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String | Self::IntOrString => "string",
            Self::Bool => "bool",
            Self::Int64 | Self::Float64 => "number",
            Self::Dynamic => "dynamic",
        }
    }
}

/// Type of an attribute
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "of", rename_all = "snake_case")]
pub enum AttributeKind {
    String,
    Bool,
    Int64,
    Float64,
    IntOrString,
    Dynamic,
    List(ElementKind),
    Map(ElementKind),
    SingleNested(Attributes),
    ListNested(Attributes),
    MapNested(Attributes),
}

impl AttributeKind {
    /// Nested attributes, if this is a nested kind
    pub fn nested(&self) -> Option<&Attributes> {
        match self {
            Self::SingleNested(a) | Self::ListNested(a) | Self::MapNested(a) => Some(a),
            _ => None,
        }
    }

    fn nested_mut(&mut self) -> Option<&mut Attributes> {
        match self {
            Self::SingleNested(a) | Self::ListNested(a) | Self::MapNested(a) => Some(a),
            _ => None,
        }
    }

    /// Human-readable type name used in diagnostics
    pub fn type_name(&self) -> String {
        match self {
            Self::String | Self::IntOrString => "string".to_string(),
            Self::Bool => "bool".to_string(),
            Self::Int64 | Self::Float64 => "number".to_string(),
            Self::Dynamic => "dynamic".to_string(),
            Self::List(e) => format!("list of {}", e.type_name()),
            Self::Map(e) => format!("map of {}", e.type_name()),
            Self::SingleNested(_) => "object".to_string(),
            Self::ListNested(_) => "list of object".to_string(),
            Self::MapNested(_) => "map of object".to_string(),
        }
    }
}

/// A single attribute definition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    #[serde(flatten)]
    pub kind: AttributeKind,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub computed: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub sensitive: bool,
    /// Changing this attribute forces replacement of the resource
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub requires_replace: bool,
    /// Field name in the Kubernetes object; `None` for provider-only attributes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<Validator>,
}

impl Attribute {
    fn new(kind: AttributeKind) -> Self {
        Self {
            kind,
            description: String::new(),
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
            requires_replace: false,
            json_name: None,
            validators: Vec::new(),
        }
    }

    pub fn required(kind: AttributeKind) -> Self {
        Self {
            required: true,
            ..Self::new(kind)
        }
    }

    pub fn optional(kind: AttributeKind) -> Self {
        Self {
            optional: true,
            ..Self::new(kind)
        }
    }

    pub fn computed(kind: AttributeKind) -> Self {
        Self {
            computed: true,
            ..Self::new(kind)
        }
    }

    pub fn required_string() -> Self {
        Self::required(AttributeKind::String)
    }

    pub fn optional_string() -> Self {
        Self::optional(AttributeKind::String)
    }

    pub fn computed_string() -> Self {
        Self::computed(AttributeKind::String)
    }

    pub fn optional_bool() -> Self {
        Self::optional(AttributeKind::Bool)
    }

    pub fn required_nested(attributes: Attributes) -> Self {
        Self::required(AttributeKind::SingleNested(attributes))
    }

    pub fn optional_nested(attributes: Attributes) -> Self {
        Self::optional(AttributeKind::SingleNested(attributes))
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Map this attribute to a field of the Kubernetes object
    pub fn mapped_to(mut self, json_name: impl Into<String>) -> Self {
        self.json_name = Some(json_name.into());
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn requiring_replace(mut self) -> Self {
        self.requires_replace = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Turn this attribute and all nested attributes into read-only ones
    pub fn into_computed(mut self) -> Self {
        self.required = false;
        self.optional = false;
        self.computed = true;
        self.requires_replace = false;
        self.validators.clear();
        if let Some(nested) = self.kind.nested_mut() {
            let taken = std::mem::take(nested);
            *nested = taken
                .into_iter()
                .map(|(name, attr)| (name, attr.into_computed()))
                .collect();
        }
        self
    }

    /// Whether the user may set this attribute in configuration
    pub fn is_configurable(&self) -> bool {
        self.required || self.optional
    }
}

/// Schema of a resource, data source or the provider itself
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    pub version: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub attributes: Attributes,
}

impl Schema {
    pub fn new(attributes: Attributes) -> Self {
        Self {
            version: 0,
            description: String::new(),
            attributes,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Look up an attribute by path of attribute names
    pub fn attribute_at(&self, path: &[&str]) -> Option<&Attribute> {
        let (first, rest) = path.split_first()?;
        let mut current = self.attributes.get(*first)?;
        for name in rest {
            current = current.kind.nested()?.get(*name)?;
        }
        Some(current)
    }

    /// Check the attribute tree for internal consistency
    ///
    /// Reports every problem found; an empty result means the schema can be
    /// served to Terraform.
    pub fn validate_implementation(&self) -> Diagnostics {
        let mut diags = Diagnostics::new();

        for name in self.attributes.keys() {
            if RESERVED_ROOT_NAMES.contains(&name.as_str()) {
                diags.add_attribute_error(
                    AttributePath::root().attribute(name),
                    "Reserved Root Attribute/Block Name",
                    format!(
                        "This schema cannot use the attribute name \"{}\" at the root \
                         because it is reserved by Terraform.",
                        name
                    ),
                );
            }
        }

        validate_attributes(&self.attributes, &AttributePath::root(), &mut diags);
        diags
    }
}

fn validate_attributes(attributes: &Attributes, parent: &AttributePath, diags: &mut Diagnostics) {
    for (name, attr) in attributes {
        let path = parent.attribute(name);

        if !ATTRIBUTE_NAME.is_match(name) {
            diags.add_attribute_error(
                path.clone(),
                "Invalid Attribute/Block Name",
                format!(
                    "Attribute name \"{}\" must contain only lowercase alphanumeric \
                     characters or underscores and must not start with a digit.",
                    path
                ),
            );
        }

        let flags = [attr.required, attr.optional, attr.computed];
        if flags.iter().all(|f| !f) {
            diags.add_attribute_error(
                path.clone(),
                "Invalid Attribute Definition",
                format!(
                    "Attribute {} must be required, optional or computed.",
                    path
                ),
            );
        }
        if attr.required && attr.computed {
            diags.add_attribute_error(
                path.clone(),
                "Invalid Attribute Definition",
                format!(
                    "Attribute {} cannot be both required and computed.",
                    path
                ),
            );
        }
        if attr.required && attr.optional {
            diags.add_attribute_error(
                path.clone(),
                "Invalid Attribute Definition",
                format!(
                    "Attribute {} cannot be both required and optional.",
                    path
                ),
            );
        }

        if let Some(nested) = attr.kind.nested() {
            if nested.is_empty() {
                diags.add_attribute_error(
                    path.clone(),
                    "Invalid Attribute Definition",
                    format!("Nested attribute {} has no attributes.", path),
                );
            }
            validate_attributes(nested, &path, diags);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert(
            "name".to_string(),
            Attribute::required_string()
                .mapped_to("name")
                .with_validator(Validator::StringLengthAtLeast { min: 1 }),
        );
        attrs
    }

    #[test]
    fn test_valid_schema() {
        let mut attrs = Attributes::new();
        attrs.insert("id".to_string(), Attribute::computed_string());
        attrs.insert(
            "metadata".to_string(),
            Attribute::required_nested(metadata()).mapped_to("metadata"),
        );
        let schema = Schema::new(attrs);

        assert!(schema.validate_implementation().is_empty());
        assert!(schema.attribute_at(&["metadata", "name"]).is_some());
        assert!(schema.attribute_at(&["metadata", "uid"]).is_none());
    }

    #[test]
    fn test_required_and_computed_is_invalid() {
        let mut attr = Attribute::required_string();
        attr.computed = true;
        let mut attrs = Attributes::new();
        attrs.insert("name".to_string(), attr);

        let diags = Schema::new(attrs).validate_implementation();
        assert!(diags.has_error());
        assert!(diags.contains("cannot be both required and computed"));
    }

    #[test]
    fn test_missing_flags_is_invalid() {
        let mut attrs = Attributes::new();
        attrs.insert(
            "spec".to_string(),
            Attribute::new(AttributeKind::Dynamic),
        );
        let diags = Schema::new(attrs).validate_implementation();
        assert!(diags.contains("must be required, optional or computed"));
    }

    #[test]
    fn test_invalid_names() {
        let mut nested = Attributes::new();
        nested.insert("secretName".to_string(), Attribute::optional_string());
        let mut attrs = Attributes::new();
        attrs.insert("count".to_string(), Attribute::optional_string());
        attrs.insert("spec".to_string(), Attribute::optional_nested(nested));

        let diags = Schema::new(attrs).validate_implementation();
        assert!(diags.contains("reserved by Terraform"));
        assert!(diags.contains("spec.secretName"));
    }

    #[test]
    fn test_empty_nested_is_invalid() {
        let mut attrs = Attributes::new();
        attrs.insert(
            "spec".to_string(),
            Attribute::optional_nested(Attributes::new()),
        );
        let diags = Schema::new(attrs).validate_implementation();
        assert!(diags.contains("has no attributes"));
    }

    #[test]
    fn test_into_computed_is_recursive() {
        let attr = Attribute::required_nested(metadata()).into_computed();
        assert!(attr.computed && !attr.required);
        let name = &attr.kind.nested().unwrap()["name"];
        assert!(name.computed && !name.required);
        assert!(name.validators.is_empty());
    }

    #[test]
    fn test_type_names() {
        assert_eq!(AttributeKind::List(ElementKind::String).type_name(), "list of string");
        assert_eq!(AttributeKind::MapNested(Attributes::new()).type_name(), "map of object");
        assert_eq!(AttributeKind::IntOrString.type_name(), "string");
    }
}
