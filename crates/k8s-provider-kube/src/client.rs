//! Dynamic object client
//!
//! Units talk to the cluster through the `ObjectClient` trait so they can be
//! exercised against `MockObjectClient` in tests. `KubeObjectClient` is the
//! real implementation on top of kube-rs' dynamic API.

use async_trait::async_trait;
use k8s_provider_core::ObjectId;
use k8s_provider_crd::CrdKind;
use kube::{
    Client,
    api::{Api, DeleteParams, DynamicObject, Patch, PatchParams, PropagationPolicy},
    discovery::ApiResource,
};
use serde_json::Value;
use std::fmt;

use crate::error::Result;

/// A single object addressed through a CRD kind
#[derive(Debug, Clone)]
pub struct ObjectTarget {
    pub api_resource: ApiResource,
    /// `None` for cluster-scoped kinds
    pub namespace: Option<String>,
    pub name: String,
}

impl ObjectTarget {
    pub fn new(kind: &CrdKind, id: ObjectId) -> Self {
        Self {
            api_resource: api_resource(kind),
            namespace: id.namespace,
            name: id.name,
        }
    }
}

impl fmt::Display for ObjectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{}/{}", ns, self.api_resource.kind, self.name),
            None => write!(f, "{}/{}", self.api_resource.kind, self.name),
        }
    }
}

/// API resource of a CRD kind, without discovery
pub fn api_resource(kind: &CrdKind) -> ApiResource {
    ApiResource {
        group: kind.group.clone(),
        version: kind.version.clone(),
        api_version: kind.api_version(),
        kind: kind.kind.clone(),
        plural: kind.plural.clone(),
    }
}

/// Operations units need from the cluster
#[async_trait]
pub trait ObjectClient: Send + Sync {
    /// Fetch an object, `None` when it does not exist
    async fn get(&self, target: &ObjectTarget) -> Result<Option<Value>>;

    /// Server-side apply an object and return the server's view of it
    async fn apply(
        &self,
        target: &ObjectTarget,
        object: &Value,
        field_manager: &str,
        force: bool,
    ) -> Result<Value>;

    /// Delete an object; returns `false` when it was already gone
    async fn delete(
        &self,
        target: &ObjectTarget,
        propagation: Option<PropagationPolicy>,
    ) -> Result<bool>;
}

/// `ObjectClient` backed by a kube-rs client
#[derive(Clone)]
pub struct KubeObjectClient {
    client: Client,
}

impl KubeObjectClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, target: &ObjectTarget) -> Api<DynamicObject> {
        match &target.namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, &target.api_resource),
            None => Api::all_with(self.client.clone(), &target.api_resource),
        }
    }
}

#[async_trait]
impl ObjectClient for KubeObjectClient {
    async fn get(&self, target: &ObjectTarget) -> Result<Option<Value>> {
        tracing::debug!(object = %target, "GET");
        let object = self.api(target).get_opt(&target.name).await?;
        Ok(object.map(serde_json::to_value).transpose()?)
    }

    async fn apply(
        &self,
        target: &ObjectTarget,
        object: &Value,
        field_manager: &str,
        force: bool,
    ) -> Result<Value> {
        tracing::debug!(object = %target, field_manager, force, "PATCH (server-side apply)");
        let mut params = PatchParams::apply(field_manager);
        params.force = force;
        let applied = self
            .api(target)
            .patch(&target.name, &params, &Patch::Apply(object))
            .await?;
        Ok(serde_json::to_value(applied)?)
    }

    async fn delete(
        &self,
        target: &ObjectTarget,
        propagation: Option<PropagationPolicy>,
    ) -> Result<bool> {
        tracing::debug!(object = %target, ?propagation, "DELETE");
        let params = DeleteParams {
            propagation_policy: propagation,
            ..Default::default()
        };
        match self.api(target).delete(&target.name, &params).await {
            Ok(_) => Ok(true),
            Err(kube::Error::Api(resp)) if resp.code == 404 => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
