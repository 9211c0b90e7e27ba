//! k8s-provider CRD support
//!
//! Loads CustomResourceDefinitions and generates the Terraform schemas of the
//! resources, data sources and manifest data sources they back.
//!
//! ```text
//!   crds/*.yaml ──► CrdParser ──► CrdCatalog ──► SchemaGenerator ──► Schema
//! ```

pub mod catalog;
pub mod error;
pub mod generate;
pub mod parser;
pub mod schema;

pub use catalog::{CrdCatalog, CrdKind};
pub use error::{CrdError, Result};
pub use generate::{PROPAGATION_POLICIES, SchemaGenerator, Variant, names};
pub use parser::CrdParser;
pub use schema::{
    AdditionalProperties, CrdNames, CrdSchema, CrdVersionSchema, OpenApiSchema, PropertyType,
    SchemaProperty,
};
