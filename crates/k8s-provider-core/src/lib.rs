//! k8s-provider core - schema descriptors and value mapping
//!
//! This crate provides the foundational types used by the provider:
//! - `Schema`: Declarative attribute trees for resources and data sources
//! - `Diagnostics`: Terraform-facing errors and warnings
//! - `value`: Mapping between Terraform values and Kubernetes objects
//! - `ObjectId`: Import identifiers (`name` or `namespace/name`)
//! - `naming`: Attribute and type naming conventions

pub mod diagnostics;
pub mod error;
pub mod import;
pub mod naming;
pub mod schema;
pub mod validators;
pub mod value;

pub use diagnostics::{AttributePath, Diagnostic, Diagnostics, PathStep, Severity};
pub use error::{CoreError, Result};
pub use import::{ObjectId, Scope};
pub use naming::{manifest_type_name, to_snake_case, type_name};
pub use schema::{Attribute, AttributeKind, Attributes, ElementKind, Schema};
pub use validators::{Validator, parse_duration};
