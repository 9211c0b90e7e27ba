//! Model of the CRD parts that drive schema generation
//!
//! Only what the generator looks at is kept: naming, scope, the served
//! versions and, per version, the OpenAPI v3 tree reduced to the keywords
//! that change an attribute's type or validation.

use k8s_provider_core::Scope;
use std::collections::BTreeMap;

/// A parsed CustomResourceDefinition
#[derive(Debug, Clone, PartialEq)]
pub struct CrdSchema {
    /// `metadata.name`, e.g. `certificates.cert-manager.io`
    pub name: String,
    pub group: String,
    pub scope: Scope,
    pub names: CrdNames,
    pub versions: Vec<CrdVersionSchema>,
}

impl CrdSchema {
    pub fn served_versions(&self) -> impl Iterator<Item = &CrdVersionSchema> {
        self.versions.iter().filter(|v| v.served)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CrdNames {
    pub kind: String,
    pub plural: String,
}

/// One entry of `spec.versions`
#[derive(Debug, Clone, PartialEq)]
pub struct CrdVersionSchema {
    pub name: String,
    pub served: bool,
    pub storage: bool,
    pub deprecated: bool,
    pub deprecation_warning: Option<String>,
    pub schema: Option<OpenApiSchema>,
}

/// `openAPIV3Schema` of a version
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OpenApiSchema {
    pub description: Option<String>,
    pub properties: BTreeMap<String, SchemaProperty>,
    pub required: Vec<String>,
}

impl OpenApiSchema {
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }
}

/// One node of the OpenAPI tree below the root
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaProperty {
    pub type_: PropertyType,
    pub description: Option<String>,
    /// `enum`, kept as JSON since CRDs may enumerate non-strings
    pub enum_values: Option<Vec<serde_json::Value>>,
    pub min_length: Option<u64>,
    pub properties: Option<BTreeMap<String, SchemaProperty>>,
    pub required: Option<Vec<String>>,
    pub items: Option<Box<SchemaProperty>>,
    pub additional_properties: Option<AdditionalProperties>,
    /// `x-kubernetes-preserve-unknown-fields`
    pub preserve_unknown_fields: bool,
    /// `x-kubernetes-embedded-resource`
    pub embedded_resource: bool,
    /// `x-kubernetes-int-or-string`
    pub int_or_string: bool,
}

impl SchemaProperty {
    pub fn has_nested_properties(&self) -> bool {
        self.properties.as_ref().is_some_and(|p| !p.is_empty())
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required
            .as_ref()
            .is_some_and(|r| r.iter().any(|n| n == name))
    }

    /// Free-form content the generator maps to a dynamic attribute
    pub fn is_free_form(&self) -> bool {
        self.preserve_unknown_fields || self.embedded_resource
    }

    /// `enum` values, when all of them are strings
    pub fn string_enum(&self) -> Option<Vec<String>> {
        let values = self.enum_values.as_ref()?;
        let strings: Vec<String> = values
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect();
        (!strings.is_empty() && strings.len() == values.len()).then_some(strings)
    }
}

/// OpenAPI `type` keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PropertyType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    /// No `type`, or one the generator does not know
    #[default]
    Unspecified,
}

impl From<Option<&str>> for PropertyType {
    fn from(value: Option<&str>) -> Self {
        match value {
            Some("string") => Self::String,
            Some("integer") => Self::Integer,
            Some("number") => Self::Number,
            Some("boolean") => Self::Boolean,
            Some("array") => Self::Array,
            Some("object") => Self::Object,
            _ => Self::Unspecified,
        }
    }
}

/// `additionalProperties` of an object
#[derive(Debug, Clone, PartialEq)]
pub enum AdditionalProperties {
    /// `true`: any value
    Any,
    /// `false`
    Denied,
    Schema(Box<SchemaProperty>),
}
