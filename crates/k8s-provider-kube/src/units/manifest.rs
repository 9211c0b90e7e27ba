//! Offline manifest rendering of a CRD kind

use async_trait::async_trait;
use k8s_provider_core::{Diagnostic, Schema, value::to_object};
use k8s_provider_crd::{CrdKind, SchemaGenerator, names};
use serde_json::{Map, Value};

use super::{DataSource, SUMMARY_MARSHAL, SUMMARY_RENDER, StateResponse, object_id};

/// Data source rendering the configured object as YAML, without a cluster
pub struct ManifestDataSource {
    kind: CrdKind,
    schema: Schema,
}

impl ManifestDataSource {
    pub fn new(kind: CrdKind) -> Self {
        let schema = SchemaGenerator::manifest(&kind);
        Self { kind, schema }
    }

    /// Render the object described by `config` as YAML
    pub fn render(&self, config: &Value) -> Result<String, Diagnostic> {
        let fields = to_object(&self.schema.attributes, config)
            .map_err(|e| Diagnostic::error(SUMMARY_MARSHAL, e.to_string()))?;

        let mut object = Map::new();
        object.insert("apiVersion".to_string(), Value::String(self.kind.api_version()));
        object.insert("kind".to_string(), Value::String(self.kind.kind.clone()));
        object.extend(fields);

        serde_yaml::to_string(&Value::Object(object))
            .map_err(|e| Diagnostic::error(SUMMARY_RENDER, e.to_string()))
    }
}

#[async_trait]
impl DataSource for ManifestDataSource {
    fn type_name(&self) -> String {
        self.kind.manifest_type_name()
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    async fn read(&self, config: &Value) -> StateResponse {
        let id = match object_id(config, self.kind.scope) {
            Ok(id) => id,
            Err(diags) => return StateResponse::failed(diags),
        };
        let yaml = match self.render(config) {
            Ok(yaml) => yaml,
            Err(diag) => return StateResponse::failed(diag),
        };
        tracing::debug!(type_name = %self.type_name(), id = %id, "rendered manifest");

        let mut state = config.as_object().cloned().unwrap_or_default();
        state.insert(names::ID.to_string(), Value::String(id.to_string()));
        state.insert(names::YAML.to_string(), Value::String(yaml));
        StateResponse::ok(Value::Object(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_provider_core::value::from_object;
    use k8s_provider_crd::CrdCatalog;
    use serde_json::json;

    const PIPELINE_CRD: &str = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: pipelines.ci.example.com
spec:
  group: ci.example.com
  scope: Namespaced
  names:
    kind: Pipeline
    plural: pipelines
  versions:
    - name: v1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          type: object
          properties:
            spec:
              type: object
              properties:
                maxSurge:
                  x-kubernetes-int-or-string: true
                ports:
                  type: array
                  items:
                    x-kubernetes-int-or-string: true
                ratio:
                  type: number
                retries:
                  type: integer
                paused:
                  type: boolean
                stages:
                  type: array
                  items:
                    type: object
                    properties:
                      name:
                        type: string
                      weight:
                        type: number
                      timeout:
                        x-kubernetes-int-or-string: true
                runners:
                  type: object
                  additionalProperties:
                    type: object
                    properties:
                      image:
                        type: string
                      cpu:
                        x-kubernetes-int-or-string: true
                env:
                  type: object
                  additionalProperties:
                    type: string
                settings:
                  type: object
                  x-kubernetes-preserve-unknown-fields: true
"#;

    fn manifest_for(catalog: &CrdCatalog, type_name: &str) -> ManifestDataSource {
        ManifestDataSource::new(catalog.get(type_name).unwrap().clone())
    }

    fn certificate() -> ManifestDataSource {
        let catalog = CrdCatalog::builtin().unwrap();
        ManifestDataSource::new(
            catalog
                .get("k8s_cert_manager_io_certificate_v1")
                .unwrap()
                .clone(),
        )
    }

    #[tokio::test]
    async fn test_render() {
        let config = json!({
            "metadata": {"name": "web", "namespace": "default", "labels": {"app": "web"}},
            "spec": {
                "secret_name": "web-tls",
                "issuer_ref": {"name": "letsencrypt", "kind": "ClusterIssuer"}
            }
        });
        let response = certificate().read(&config).await;
        assert!(!response.has_error(), "{}", response.diagnostics);

        let state = response.state.unwrap();
        assert_eq!(state["id"], "default/web");
        assert_eq!(state["spec"]["secret_name"], "web-tls");
        insta::assert_snapshot!(state["yaml"].as_str().unwrap(), @r"
        apiVersion: cert-manager.io/v1
        kind: Certificate
        metadata:
          labels:
            app: web
          name: web
          namespace: default
        spec:
          issuerRef:
            kind: ClusterIssuer
            name: letsencrypt
          secretName: web-tls
        ");
    }

    #[tokio::test]
    async fn test_yaml_round_trip() {
        let manifest = certificate();
        let config = json!({
            "metadata": {
                "name": "web",
                "namespace": "default",
                "labels": {"app": "web"},
                "annotations": {"example.com/owner": "team-a"}
            },
            "spec": {
                "secret_name": "web-tls",
                "common_name": "web.example.com",
                "dns_names": ["web.example.com", "www.example.com"],
                "is_ca": false,
                "renew_before_percentage": 25,
                "issuer_ref": {"name": "letsencrypt", "kind": "ClusterIssuer", "group": "cert-manager.io"},
                "private_key": {"algorithm": "ECDSA", "size": 256, "rotation_policy": "Always"},
                "secret_template": {"labels": {"tier": "frontend"}},
                "usages": ["server auth", "client auth"]
            }
        });

        let state = manifest.read(&config).await.state.unwrap();
        let parsed: Value = serde_yaml::from_str(state["yaml"].as_str().unwrap()).unwrap();
        assert_eq!(parsed["apiVersion"], "cert-manager.io/v1");
        assert_eq!(parsed["kind"], "Certificate");

        let back = from_object(&manifest.schema().attributes, parsed.as_object().unwrap());
        assert_configured_values(&config, &back, "");
    }

    #[tokio::test]
    async fn test_yaml_round_trip_all_kinds() {
        let mut catalog = CrdCatalog::new();
        catalog.add_yaml(PIPELINE_CRD).unwrap();
        let manifest = manifest_for(&catalog, "k8s_ci_example_com_pipeline_v1");
        let config = json!({
            "metadata": {"name": "build", "namespace": "ci"},
            "spec": {
                "max_surge": "25%",
                "ports": ["8080", "08080", "+80", "http"],
                "ratio": 0.75,
                "retries": 3,
                "paused": false,
                "stages": [
                    {"name": "test", "weight": 1.5, "timeout": "10"},
                    {"name": "lint", "weight": 0.5, "timeout": "-0"}
                ],
                "runners": {
                    "linux": {"image": "rust:1", "cpu": "2"},
                    "arm": {"image": "rust:1-slim", "cpu": "500m"}
                },
                "env": {"CARGO_TERM_COLOR": "always"},
                "settings": {"cache": {"enabled": true, "paths": ["target", "vendor"]}, "shards": 4}
            }
        });

        let response = manifest.read(&config).await;
        assert!(!response.has_error(), "{}", response.diagnostics);
        let yaml = response.state.unwrap()["yaml"].as_str().unwrap().to_string();
        let parsed: Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed["spec"]["ports"], json!([8080, "08080", "+80", "http"]));
        assert_eq!(parsed["spec"]["stages"][0]["timeout"], json!(10));
        assert_eq!(parsed["spec"]["runners"]["linux"]["cpu"], json!(2));

        let back = from_object(&manifest.schema().attributes, parsed.as_object().unwrap());
        assert_configured_values(&config, &back, "");
    }

    #[tokio::test]
    async fn test_service_monitor_target_ports() {
        let catalog = CrdCatalog::builtin().unwrap();
        let manifest = manifest_for(&catalog, "k8s_monitoring_coreos_com_service_monitor_v1");
        let config = json!({
            "metadata": {"name": "web", "namespace": "monitoring"},
            "spec": {
                "selector": {"match_labels": {"app": "web"}},
                "endpoints": [
                    {"target_port": "08080", "path": "/metrics"},
                    {"target_port": "+80"},
                    {"target_port": "9090", "interval": "30s"},
                    {"target_port": "metrics"}
                ]
            }
        });

        let state = manifest.read(&config).await.state.unwrap();
        let parsed: Value = serde_yaml::from_str(state["yaml"].as_str().unwrap()).unwrap();
        let ports: Vec<&Value> = parsed["spec"]["endpoints"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| &e["targetPort"])
            .collect();
        assert_eq!(ports, [&json!("08080"), &json!("+80"), &json!(9090), &json!("metrics")]);

        let back = from_object(&manifest.schema().attributes, parsed.as_object().unwrap());
        assert_configured_values(&config, &back, "");
    }

    #[tokio::test]
    async fn test_null_endpoint_renders() {
        let catalog = CrdCatalog::builtin().unwrap();
        let manifest = manifest_for(&catalog, "k8s_monitoring_coreos_com_service_monitor_v1");
        let config = json!({
            "metadata": {"name": "web", "namespace": "monitoring"},
            "spec": {"selector": {"match_labels": {"app": "web"}}, "endpoints": [null]}
        });

        assert!(!manifest.validate_config(&config).has_error());
        let response = manifest.read(&config).await;
        assert!(!response.has_error(), "{}", response.diagnostics);
        let parsed: Value =
            serde_yaml::from_str(response.state.unwrap()["yaml"].as_str().unwrap()).unwrap();
        assert_eq!(parsed["spec"]["endpoints"], json!([null]));
    }

    /// Every value set in `expected` is present unchanged in `actual`
    fn assert_configured_values(expected: &Value, actual: &Value, path: &str) {
        match expected {
            Value::Object(map) => {
                for (key, value) in map {
                    assert_configured_values(value, &actual[key], &format!("{}.{}", path, key));
                }
            }
            Value::Array(items) => {
                let actual_items = actual.as_array().unwrap_or_else(|| panic!("{}: not a list", path));
                assert_eq!(actual_items.len(), items.len(), "{}", path);
                for (i, (e, a)) in items.iter().zip(actual_items).enumerate() {
                    assert_configured_values(e, a, &format!("{}[{}]", path, i));
                }
            }
            _ => assert_eq!(actual, expected, "{}", path),
        }
    }

    #[tokio::test]
    async fn test_missing_name() {
        let response = certificate()
            .read(&json!({"metadata": {"namespace": "default"}}))
            .await;
        assert!(response.has_error());
        assert!(response.state.is_none());
    }

    #[test]
    fn test_type_name() {
        assert_eq!(
            certificate().type_name(),
            "k8s_cert_manager_io_certificate_v1_manifest"
        );
        assert!(certificate().schema().attributes.contains_key("yaml"));
    }
}
