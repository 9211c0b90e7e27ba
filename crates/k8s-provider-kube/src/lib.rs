//! k8s-provider Kube - the provider surface backed by the Kubernetes API
//!
//! This crate provides:
//! - **Provider**: Configuration, offline mode and unit registration
//! - **Units**: One resource, one data source and one manifest data source per CRD kind
//! - **Client**: Server-side apply, get and delete through a dynamic `kube` client
//! - **Wait**: JSONPath upsert conditions and deletion polling
//! - **Mock**: In-memory object client for tests

pub mod client;
pub mod config;
pub mod error;
pub mod mock;
pub mod provider;
pub mod units;
pub mod wait;

pub use client::{KubeObjectClient, ObjectClient, ObjectTarget, api_resource};
pub use config::{DEFAULT_FIELD_MANAGER, ProviderConfig};
pub use error::{KubeError, Result};
pub use mock::{MockObjectClient, Operation, OperationCounts};
pub use provider::{Provider, ProviderSchema};
pub use units::{
    CustomDataSource, CustomResource, DataSource, ManifestDataSource, PlanResponse, Resource,
    StateResponse, UnitContext,
};
pub use wait::{WaitForDelete, WaitForUpsert};
