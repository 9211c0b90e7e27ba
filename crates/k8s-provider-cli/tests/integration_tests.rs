//! Integration tests for CLI commands
//!
//! Only offline paths are exercised; nothing here needs a cluster.

use std::path::{Path, PathBuf};
use std::process::Command;

const CERTIFICATE: &str = "k8s_cert_manager_io_certificate_v1";
const CLUSTER_ISSUER: &str = "k8s_cert_manager_io_cluster_issuer_v1";

/// Helper to run the k8s-provider binary
fn k8s_provider(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_k8s-provider"))
        .args(args)
        .env_remove("KUBECONFIG")
        .env_remove("K8S_PROVIDER_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute k8s-provider")
}

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

const CERTIFICATE_CONFIG: &str = r#"
metadata:
  name: web
  namespace: default
  labels:
    app: web
spec:
  secret_name: web-tls
  issuer_ref:
    name: letsencrypt
    kind: ClusterIssuer
"#;

mod types_command {
    use super::*;

    #[test]
    fn test_types_lists_builtin_kinds() {
        let output = k8s_provider(&["types"]);
        assert!(output.status.success());

        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains(CERTIFICATE));
        assert!(stdout.contains(&format!("{}_manifest", CERTIFICATE)));
        assert!(stdout.contains("k8s_monitoring_coreos_com_service_monitor_v1"));
    }

    #[test]
    fn test_types_json_with_crd_dir() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "widgets.yaml",
            r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: widgets.example.com
spec:
  group: example.com
  scope: Cluster
  names:
    kind: Widget
    plural: widgets
  versions:
    - name: v1alpha1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          type: object
          properties:
            spec:
              type: object
              properties:
                size:
                  type: string
"#,
        );

        let output = k8s_provider(&[
            "types",
            "--json",
            "--crd-dir",
            dir.path().to_str().unwrap(),
        ]);
        assert!(output.status.success());

        let json: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("Output should be valid JSON");
        let resources = json["resources"].as_array().unwrap();
        assert_eq!(resources.len(), 4);
        assert!(resources.contains(&serde_json::json!("k8s_example_com_widget_v1alpha1")));
        assert_eq!(json["data_sources"].as_array().unwrap().len(), 8);
    }

    #[test]
    fn test_missing_crd_dir() {
        let output = k8s_provider(&["types", "--crd-dir", "/nonexistent/crds"]);
        assert_eq!(output.status.code(), Some(5));
    }
}

mod schema_command {
    use super::*;

    #[test]
    fn test_provider_schema() {
        let output = k8s_provider(&["schema"]);
        assert!(output.status.success());

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert!(json["provider"]["attributes"]["offline"].is_object());
        assert!(json["resources"][CERTIFICATE]["attributes"]["wait_for_upsert"].is_object());
        assert!(json["data_sources"][format!("{}_manifest", CERTIFICATE)]["attributes"]["yaml"].is_object());
    }

    #[test]
    fn test_data_source_schema() {
        let output = k8s_provider(&["schema", CLUSTER_ISSUER, "--data-source"]);
        assert!(output.status.success());

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let attributes = json["attributes"].as_object().unwrap();
        assert!(attributes.contains_key("spec"));
        assert!(!attributes.contains_key("force_conflicts"));
    }

    #[test]
    fn test_unknown_type() {
        let output = k8s_provider(&["schema", "k8s_nope_v1"]);
        assert_eq!(output.status.code(), Some(64));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("k8s_nope_v1"));
    }
}

mod validate_command {
    use super::*;

    #[test]
    fn test_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_file(dir.path(), "cert.yaml", CERTIFICATE_CONFIG);

        let output = k8s_provider(&["validate", CERTIFICATE, "-f", file.to_str().unwrap()]);
        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
        assert!(String::from_utf8_lossy(&output.stdout).contains("valid"));
    }

    #[test]
    fn test_missing_name() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_file(
            dir.path(),
            "cert.yaml",
            "metadata:\n  namespace: default\n",
        );

        let output = k8s_provider(&["validate", CERTIFICATE, "-f", file.to_str().unwrap()]);
        assert_eq!(output.status.code(), Some(2));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains(r#"attribute "name" is required"#), "{}", stderr);
    }

    #[test]
    fn test_empty_name() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_file(
            dir.path(),
            "cert.json",
            r#"{"metadata": {"name": "", "namespace": "default"}}"#,
        );

        let output = k8s_provider(&["validate", CERTIFICATE, "-f", file.to_str().unwrap()]);
        assert_eq!(output.status.code(), Some(2));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("string length must be at least 1"), "{}", stderr);
    }

    #[test]
    fn test_unparsable_input() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_file(dir.path(), "cert.yaml", "metadata: [unclosed\n");

        let output = k8s_provider(&["validate", CERTIFICATE, "-f", file.to_str().unwrap()]);
        assert_eq!(output.status.code(), Some(2));
    }
}

mod manifest_command {
    use super::*;

    #[test]
    fn test_render() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_file(dir.path(), "cert.yaml", CERTIFICATE_CONFIG);

        let output = k8s_provider(&["manifest", CERTIFICATE, "-f", file.to_str().unwrap()]);
        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

        insta::assert_snapshot!(String::from_utf8_lossy(&output.stdout), @r"
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

    #[test]
    fn test_render_with_manifest_suffix_offline() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_file(
            dir.path(),
            "issuer.yaml",
            "metadata:\n  name: selfsigned\nspec:\n  self_signed: {}\n",
        );

        let name = format!("{}_manifest", CLUSTER_ISSUER);
        let output = k8s_provider(&["manifest", &name, "-f", file.to_str().unwrap(), "--offline"]);
        assert!(output.status.success());

        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("kind: ClusterIssuer"));
        assert!(stdout.contains("selfSigned: {}"));
        assert!(!stdout.contains("namespace"));
    }
}

mod offline_mode {
    use super::*;

    #[test]
    fn test_read_offline() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_file(
            dir.path(),
            "cert.yaml",
            "metadata:\n  name: web\n  namespace: default\n",
        );

        let output = k8s_provider(&["read", CERTIFICATE, "-f", file.to_str().unwrap(), "--offline"]);
        assert_eq!(output.status.code(), Some(3));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("Provider in Offline Mode"), "{}", stderr);
    }

    #[test]
    fn test_apply_offline_from_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_file(dir.path(), "provider.yaml", "offline: true\n");
        let file = write_file(dir.path(), "cert.yaml", CERTIFICATE_CONFIG);

        let output = k8s_provider(&[
            "apply",
            CERTIFICATE,
            "-f",
            file.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
        ]);
        assert_eq!(output.status.code(), Some(3));
        assert!(String::from_utf8_lossy(&output.stderr).contains("Provider in Offline Mode"));
    }

    #[test]
    fn test_import_invalid_id() {
        let output = k8s_provider(&["import", CERTIFICATE, "web", "--offline"]);
        assert_eq!(output.status.code(), Some(2));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("<namespace>/<name>"), "{}", stderr);
    }

    #[test]
    fn test_import_offline() {
        let output = k8s_provider(&["import", CLUSTER_ISSUER, "letsencrypt", "--offline"]);
        assert_eq!(output.status.code(), Some(3));
    }

    #[test]
    fn test_invalid_provider_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_file(dir.path(), "provider.yaml", "offline: true\nregion: eu\n");
        let file = write_file(dir.path(), "cert.yaml", CERTIFICATE_CONFIG);

        let output = k8s_provider(&[
            "destroy",
            CERTIFICATE,
            "-f",
            file.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
        ]);
        assert_eq!(output.status.code(), Some(3));
        assert!(String::from_utf8_lossy(&output.stderr).contains("region"));
    }
}
