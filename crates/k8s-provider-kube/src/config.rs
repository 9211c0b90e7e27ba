//! Provider configuration
//!
//! Mirrors the provider block of a Terraform configuration:
//!
//! ```hcl
//! provider "k8s" {
//!   kubeconfig      = "~/.kube/config"
//!   context         = "kind-dev"
//!   field_manager   = "terraform-provider-k8s"
//!   force_conflicts = false
//!   offline         = false
//! }
//! ```

use k8s_provider_core::{Attribute, Attributes, Schema, Validator, value::without_nulls};
use kube::{
    Client, Config,
    config::{KubeConfigOptions, Kubeconfig},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

use crate::error::{KubeError, Result};

/// Field manager used for server-side apply unless configured otherwise
pub const DEFAULT_FIELD_MANAGER: &str = "terraform-provider-k8s";

/// Provider-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    /// Never talk to a cluster; only manifest data sources work
    pub offline: bool,
    /// Path to a kubeconfig file, otherwise the environment is inferred
    pub kubeconfig: Option<PathBuf>,
    /// Kubeconfig context to use
    pub context: Option<String>,
    pub field_manager: String,
    pub force_conflicts: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            offline: false,
            kubeconfig: None,
            context: None,
            field_manager: DEFAULT_FIELD_MANAGER.to_string(),
            force_conflicts: false,
        }
    }
}

impl ProviderConfig {
    /// Schema of the provider block
    pub fn schema() -> Schema {
        let mut attributes = Attributes::new();
        attributes.insert(
            "offline".to_string(),
            Attribute::optional_bool().with_description(
                "Run without a cluster connection. Only manifest data sources can be read.",
            ),
        );
        attributes.insert(
            "kubeconfig".to_string(),
            Attribute::optional_string().with_description(
                "Path to the kubeconfig file. Defaults to KUBECONFIG, ~/.kube/config \
                 or the in-cluster service account.",
            ),
        );
        attributes.insert(
            "context".to_string(),
            Attribute::optional_string()
                .with_description("Kubeconfig context to use. Defaults to the current context."),
        );
        attributes.insert(
            "field_manager".to_string(),
            Attribute::optional_string()
                .with_description(format!(
                    "Default field manager for server-side apply. Defaults to '{}'.",
                    DEFAULT_FIELD_MANAGER
                ))
                .with_validator(Validator::StringLengthAtLeast { min: 1 }),
        );
        attributes.insert(
            "force_conflicts".to_string(),
            Attribute::optional_bool()
                .with_description("Default force flag for server-side apply. Defaults to 'false'."),
        );
        Schema::new(attributes)
            .with_description("Manage Kubernetes custom resources through their CRD schemas.")
    }

    /// Parse a provider block value; `null` attributes take their defaults
    pub fn from_value(value: &Value) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        let config = serde_json::from_value(without_nulls(value))
            .map_err(|e| KubeError::InvalidConfig(e.to_string()))?;
        Ok(config)
    }

    /// Parse a YAML (or JSON) configuration file
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(yaml)
            .map_err(|e| KubeError::InvalidConfig(e.to_string()))?;
        Self::from_value(&value)
    }

    /// Build a Kubernetes client from this configuration
    pub async fn connect(&self) -> Result<Client> {
        if self.offline {
            return Err(KubeError::InvalidConfig(
                "cannot connect while offline".to_string(),
            ));
        }

        let options = KubeConfigOptions {
            context: self.context.clone(),
            ..Default::default()
        };

        let config = match (&self.kubeconfig, &self.context) {
            (Some(path), _) => {
                tracing::debug!(path = %path.display(), context = ?self.context, "loading kubeconfig");
                let kubeconfig = Kubeconfig::read_from(path)
                    .map_err(|e| KubeError::InvalidConfig(e.to_string()))?;
                Config::from_custom_kubeconfig(kubeconfig, &options)
                    .await
                    .map_err(|e| KubeError::InvalidConfig(e.to_string()))?
            }
            (None, Some(context)) => {
                tracing::debug!(context, "loading default kubeconfig");
                Config::from_kubeconfig(&options)
                    .await
                    .map_err(|e| KubeError::InvalidConfig(e.to_string()))?
            }
            (None, None) => Config::infer()
                .await
                .map_err(|e| KubeError::InvalidConfig(e.to_string()))?,
        };

        Ok(Client::try_from(config)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = ProviderConfig::from_value(&Value::Null).unwrap();
        assert_eq!(config.field_manager, DEFAULT_FIELD_MANAGER);
        assert!(!config.offline);
        assert!(!config.force_conflicts);
    }

    #[test]
    fn test_from_value_with_nulls() {
        let config = ProviderConfig::from_value(&json!({
            "offline": true,
            "kubeconfig": null,
            "context": "kind-dev",
            "field_manager": null,
            "force_conflicts": null,
        }))
        .unwrap();
        assert!(config.offline);
        assert_eq!(config.context.as_deref(), Some("kind-dev"));
        assert_eq!(config.field_manager, DEFAULT_FIELD_MANAGER);
    }

    #[test]
    fn test_from_yaml() {
        let config =
            ProviderConfig::from_yaml("field_manager: ci\nforce_conflicts: true\n").unwrap();
        assert_eq!(config.field_manager, "ci");
        assert!(config.force_conflicts);

        assert!(ProviderConfig::from_yaml("unknown: 1\n").is_err());
    }

    #[test]
    fn test_schema_is_valid() {
        assert!(ProviderConfig::schema().validate_implementation().is_empty());
    }

    #[tokio::test]
    async fn test_connect_offline_refused() {
        let config = ProviderConfig {
            offline: true,
            ..Default::default()
        };
        assert!(config.connect().await.is_err());
    }
}
