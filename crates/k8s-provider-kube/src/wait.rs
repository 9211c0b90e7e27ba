//! Wait loops after apply and delete
//!
//! Both loops poll with a fixed interval until their condition holds or the
//! timeout elapses. Dropping the returned future cancels the wait.

use jsonpath_rust::JsonPath;
use k8s_provider_core::value::without_nulls;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::Instant;

use crate::client::{ObjectClient, ObjectTarget};
use crate::error::{KubeError, Result};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Floor for configured poll intervals
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn default_poll_interval() -> Duration {
    DEFAULT_POLL_INTERVAL
}

fn pause(interval: Duration) -> tokio::time::Sleep {
    tokio::time::sleep(interval.max(MIN_POLL_INTERVAL))
}

/// `wait_for_delete` block of a resource
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WaitForDelete {
    #[serde(with = "humantime_serde", default = "default_timeout")]
    pub timeout: Duration,
    #[serde(with = "humantime_serde", default = "default_poll_interval")]
    pub poll_interval: Duration,
}

impl Default for WaitForDelete {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// One entry of the `wait_for_upsert` list of a resource
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WaitForUpsert {
    /// JSONPath relative to the object root, e.g. `.status.phase`
    pub jsonpath: String,
    pub value: String,
    #[serde(with = "humantime_serde", default = "default_timeout")]
    pub timeout: Duration,
    #[serde(with = "humantime_serde", default = "default_poll_interval")]
    pub poll_interval: Duration,
}

impl WaitForDelete {
    /// Read the block from a Terraform value, `None` when unset
    pub fn from_state(value: Option<&Value>) -> Result<Option<Self>> {
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(v) => Ok(Some(serde_json::from_value(without_nulls(v))?)),
        }
    }
}

impl WaitForUpsert {
    /// Read the list from a Terraform value, empty when unset
    pub fn list_from_state(value: Option<&Value>) -> Result<Vec<Self>> {
        match value {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(v) => Ok(serde_json::from_value(without_nulls(v))?),
        }
    }

    /// Whether the object satisfies this condition
    ///
    /// Scalars are compared by their string form; a path that matches
    /// nothing never satisfies the condition.
    pub fn matches(&self, object: &Value) -> Result<bool> {
        let found = evaluate(&self.jsonpath, object)?;
        Ok(found.as_deref() == Some(self.value.as_str()))
    }
}

/// Evaluate a JSONPath expression, returning the first match as a string
///
/// Accepts `$.a.b`, `.a.b` and the kubectl form `{.a.b}`.
pub fn evaluate(expression: &str, object: &Value) -> Result<Option<String>> {
    let trimmed = expression.trim();
    let trimmed = trimmed
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .unwrap_or(trimmed);
    let normalized = if trimmed.starts_with('$') {
        trimmed.to_string()
    } else if trimmed.starts_with('.') || trimmed.starts_with('[') {
        format!("${}", trimmed)
    } else {
        format!("$.{}", trimmed)
    };

    let path: JsonPath = JsonPath::from_str(&normalized).map_err(|e| KubeError::JsonPath {
        expression: expression.to_string(),
        message: e.to_string(),
    })?;

    let first = match path.find(object) {
        Value::Null => None,
        Value::Array(items) => items.into_iter().next(),
        other => Some(other),
    };

    Ok(first.and_then(|v| match v {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }))
}

/// Poll until the object is gone
pub async fn wait_for_delete(
    client: &dyn ObjectClient,
    target: &ObjectTarget,
    opts: &WaitForDelete,
) -> Result<()> {
    let deadline = Instant::now() + opts.timeout;
    loop {
        if client.get(target).await?.is_none() {
            tracing::debug!(object = %target, "object deleted");
            return Ok(());
        }

        if Instant::now() >= deadline {
            tracing::warn!(object = %target, timeout = ?opts.timeout, "timed out waiting for deletion");
            return Err(KubeError::Timeout {
                what: "deletion".to_string(),
                target: target.to_string(),
                after: humantime_serde::re::humantime::format_duration(opts.timeout).to_string(),
            });
        }

        pause(opts.poll_interval).await;
    }
}

/// Poll until every condition holds, returning the last object seen
///
/// Conditions are awaited in order, each with its own timeout.
pub async fn wait_for_upsert(
    client: &dyn ObjectClient,
    target: &ObjectTarget,
    conditions: &[WaitForUpsert],
) -> Result<Option<Value>> {
    let mut last = None;
    for condition in conditions {
        let deadline = Instant::now() + condition.timeout;
        loop {
            let object = client
                .get(target)
                .await?
                .ok_or_else(|| KubeError::NotFound {
                    target: target.to_string(),
                })?;

            if condition.matches(&object)? {
                tracing::debug!(
                    object = %target,
                    jsonpath = %condition.jsonpath,
                    value = %condition.value,
                    "upsert condition met"
                );
                last = Some(object);
                break;
            }

            if Instant::now() >= deadline {
                tracing::warn!(
                    object = %target,
                    jsonpath = %condition.jsonpath,
                    timeout = ?condition.timeout,
                    "timed out waiting for upsert condition"
                );
                return Err(KubeError::Timeout {
                    what: format!("{} = {}", condition.jsonpath, condition.value),
                    target: target.to_string(),
                    after: humantime_serde::re::humantime::format_duration(condition.timeout)
                        .to_string(),
                });
            }

            pause(condition.poll_interval).await;
        }
    }
    Ok(last)
}
