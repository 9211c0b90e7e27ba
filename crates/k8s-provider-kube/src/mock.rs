//! Mock object client for testing
//!
//! Stores objects in memory, useful for unit tests without requiring a
//! Kubernetes cluster. Failures and slow server-side effects (finalizers,
//! controllers updating status) can be scripted.

use async_trait::async_trait;
use kube::api::PropagationPolicy;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::client::{ObjectClient, ObjectTarget};
use crate::error::{KubeError, Result};

/// Operation kinds of the mock, for failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Get,
    Apply,
    Delete,
}

/// Counts of operations performed for testing assertions
#[derive(Debug, Default, Clone)]
pub struct OperationCounts {
    pub gets: usize,
    pub applies: usize,
    pub deletes: usize,
}

/// Object state that becomes visible after a number of reads
#[derive(Debug, Clone)]
enum Pending {
    /// Object is removed once `gets` reads have seen it
    Removal { gets: usize },
    /// `status` is set once `gets` reads have seen the object without it
    Status { gets: usize, status: Value },
}

#[derive(Debug, Default)]
struct MockState {
    objects: HashMap<String, Value>,
    pending: HashMap<String, Pending>,
    failures: HashMap<Operation, (u16, String)>,
    last_apply: Option<(String, bool)>,
    last_propagation: Option<PropagationPolicy>,
    delete_delay: usize,
    generation: u64,
}

/// In-memory `ObjectClient`
#[derive(Clone, Default)]
pub struct MockObjectClient {
    state: Arc<RwLock<MockState>>,
    operations: Arc<RwLock<OperationCounts>>,
}

impl MockObjectClient {
    /// Create a new empty mock client
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object as if it already existed in the cluster
    pub fn insert(&self, target: &ObjectTarget, object: Value) {
        let mut state = self.state.write().unwrap();
        state.objects.insert(target.to_string(), object);
    }

    /// Current object, without counting a read
    pub fn object(&self, target: &ObjectTarget) -> Option<Value> {
        self.state
            .read()
            .unwrap()
            .objects
            .get(&target.to_string())
            .cloned()
    }

    /// Make every call of `operation` fail with an API error
    pub fn fail_on(&self, operation: Operation, code: u16, message: impl Into<String>) {
        let mut state = self.state.write().unwrap();
        state.failures.insert(operation, (code, message.into()));
    }

    /// Keep deleted objects visible for `gets` more reads
    pub fn delay_deletion(&self, gets: usize) {
        self.state.write().unwrap().delete_delay = gets;
    }

    /// Set `status` of an object after it has been read `gets` times
    pub fn set_status_after(&self, target: &ObjectTarget, gets: usize, status: Value) {
        let mut state = self.state.write().unwrap();
        state
            .pending
            .insert(target.to_string(), Pending::Status { gets, status });
    }

    /// Field manager and force flag of the last apply
    pub fn last_apply(&self) -> Option<(String, bool)> {
        self.state.read().unwrap().last_apply.clone()
    }

    /// Propagation policy of the last delete
    pub fn last_propagation(&self) -> Option<PropagationPolicy> {
        self.state.read().unwrap().last_propagation.clone()
    }

    /// Get operation counts for assertions
    pub fn operation_counts(&self) -> OperationCounts {
        self.operations.read().unwrap().clone()
    }

    /// Reset operation counts
    pub fn reset_counts(&self) {
        let mut ops = self.operations.write().unwrap();
        *ops = OperationCounts::default();
    }

    fn check_failure(&self, operation: Operation) -> Result<()> {
        let state = self.state.read().unwrap();
        match state.failures.get(&operation) {
            Some((code, message)) => Err(api_error(*code, message)),
            None => Ok(()),
        }
    }
}

/// Build the error kube-rs returns for an API status response
fn api_error(code: u16, message: &str) -> KubeError {
    let reason = match code {
        404 => "NotFound",
        409 => "Conflict",
        403 => "Forbidden",
        _ => "InternalError",
    };
    let response = json!({
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code,
    });
    match serde_json::from_value::<kube::core::ErrorResponse>(response) {
        Ok(resp) => KubeError::Api(kube::Error::Api(resp)),
        Err(e) => KubeError::Serialization(e.to_string()),
    }
}

#[async_trait]
impl ObjectClient for MockObjectClient {
    async fn get(&self, target: &ObjectTarget) -> Result<Option<Value>> {
        self.operations.write().unwrap().gets += 1;
        self.check_failure(Operation::Get)?;

        let key = target.to_string();
        let mut state = self.state.write().unwrap();
        let object = state.objects.get(&key).cloned();

        match state.pending.remove(&key) {
            Some(Pending::Removal { gets }) if gets <= 1 => {
                state.objects.remove(&key);
            }
            Some(Pending::Removal { gets }) => {
                state.pending.insert(key, Pending::Removal { gets: gets - 1 });
            }
            Some(Pending::Status { gets, status }) if gets <= 1 => {
                if let Some(Value::Object(obj)) = state.objects.get_mut(&key) {
                    obj.insert("status".to_string(), status);
                }
            }
            Some(Pending::Status { gets, status }) => {
                state.pending.insert(
                    key,
                    Pending::Status {
                        gets: gets - 1,
                        status,
                    },
                );
            }
            None => {}
        }

        Ok(object)
    }

    async fn apply(
        &self,
        target: &ObjectTarget,
        object: &Value,
        field_manager: &str,
        force: bool,
    ) -> Result<Value> {
        self.operations.write().unwrap().applies += 1;
        self.check_failure(Operation::Apply)?;

        let key = target.to_string();
        let mut state = self.state.write().unwrap();
        state.last_apply = Some((field_manager.to_string(), force));
        state.generation += 1;
        let generation = state.generation;

        let mut stored = object.clone();
        let status = state
            .objects
            .get(&key)
            .and_then(|existing| existing.get("status"))
            .cloned();
        if let Value::Object(obj) = &mut stored {
            if let Some(status) = status {
                obj.insert("status".to_string(), status);
            }
            let metadata = obj
                .entry("metadata")
                .or_insert_with(|| Value::Object(Default::default()));
            if let Value::Object(meta) = metadata {
                meta.insert(
                    "uid".to_string(),
                    Value::String(format!("00000000-0000-0000-0000-{:012}", generation)),
                );
                meta.insert(
                    "resourceVersion".to_string(),
                    Value::String(generation.to_string()),
                );
            }
        }
        state.objects.insert(key, stored.clone());
        Ok(stored)
    }

    async fn delete(
        &self,
        target: &ObjectTarget,
        propagation: Option<PropagationPolicy>,
    ) -> Result<bool> {
        self.operations.write().unwrap().deletes += 1;
        self.check_failure(Operation::Delete)?;

        let key = target.to_string();
        let mut state = self.state.write().unwrap();
        state.last_propagation = propagation;
        if !state.objects.contains_key(&key) {
            return Ok(false);
        }
        if state.delete_delay == 0 {
            state.objects.remove(&key);
        } else {
            let gets = state.delete_delay;
            state.pending.insert(key, Pending::Removal { gets });
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_provider_core::ObjectId;
    use k8s_provider_crd::CrdCatalog;

    fn target() -> ObjectTarget {
        let catalog = CrdCatalog::builtin().unwrap();
        let kind = catalog.get("k8s_cert_manager_io_certificate_v1").unwrap();
        ObjectTarget::new(kind, ObjectId::namespaced("default", "web"))
    }

    #[tokio::test]
    async fn test_apply_and_get() {
        let client = MockObjectClient::new();
        let object = json!({"metadata": {"name": "web"}, "spec": {"secretName": "web-tls"}});

        let applied = client.apply(&target(), &object, "tf", true).await.unwrap();
        assert_eq!(applied["metadata"]["resourceVersion"], "1");
        assert_eq!(client.last_apply(), Some(("tf".to_string(), true)));

        let fetched = client.get(&target()).await.unwrap().unwrap();
        assert_eq!(fetched["spec"]["secretName"], "web-tls");

        let counts = client.operation_counts();
        assert_eq!(counts.applies, 1);
        assert_eq!(counts.gets, 1);
    }

    #[tokio::test]
    async fn test_delete_missing_object() {
        let client = MockObjectClient::new();
        assert!(!client.delete(&target(), None).await.unwrap());
    }

    #[tokio::test]
    async fn test_delayed_deletion() {
        let client = MockObjectClient::new();
        client.insert(&target(), json!({"metadata": {"name": "web"}}));
        client.delay_deletion(2);

        assert!(client.delete(&target(), None).await.unwrap());
        assert!(client.get(&target()).await.unwrap().is_some());
        assert!(client.get(&target()).await.unwrap().is_some());
        assert!(client.get(&target()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let client = MockObjectClient::new();
        client.fail_on(Operation::Get, 403, "forbidden");
        let err = client.get(&target()).await.unwrap_err();
        assert!(err.to_string().contains("forbidden"));

        client.fail_on(Operation::Delete, 404, "gone");
        assert!(client.delete(&target(), None).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_status_after_gets() {
        let client = MockObjectClient::new();
        client.insert(&target(), json!({"metadata": {"name": "web"}}));
        client.set_status_after(&target(), 1, json!({"phase": "Ready"}));

        let first = client.get(&target()).await.unwrap().unwrap();
        assert!(first.get("status").is_none());
        let second = client.get(&target()).await.unwrap().unwrap();
        assert_eq!(second["status"]["phase"], "Ready");
    }
}
