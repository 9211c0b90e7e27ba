//! Attribute validators
//!
//! Validators run after type checking during configuration validation. They
//! only see non-null values.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::diagnostics::{AttributePath, Diagnostics};

/// Qualified name part of a label or annotation key
static QUALIFIED_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]([-A-Za-z0-9_.]*[A-Za-z0-9])?$").unwrap());

/// DNS-1123 subdomain, used as key prefix
static DNS_SUBDOMAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$").unwrap()
});

/// Label values: empty or a qualified name of at most 63 characters
static LABEL_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9])?$").unwrap());

const MAX_NAME_LENGTH: usize = 63;
const MAX_PREFIX_LENGTH: usize = 253;

/// Validator attached to an attribute
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Validator {
    /// String must be at least N characters long
    StringLengthAtLeast { min: usize },
    /// String must be one of the listed values
    StringOneOf { values: Vec<String> },
    /// String must be a humantime duration ("10s", "2m")
    Duration,
    /// Like `Duration`, and must not be zero
    NonZeroDuration,
    /// Map keys must be valid label keys and values valid label values
    Labels,
    /// Map keys must be valid annotation keys
    Annotations,
}

impl Validator {
    /// Validate a non-null value, reporting problems at `path`
    pub fn validate(&self, path: &AttributePath, value: &Value, diags: &mut Diagnostics) {
        match self {
            Self::StringLengthAtLeast { min } => {
                if let Some(s) = value.as_str() {
                    let len = s.chars().count();
                    if len < *min {
                        diags.add_attribute_error(
                            path.clone(),
                            "Invalid Attribute Value Length",
                            format!(
                                "Attribute {} string length must be at least {}, got: {}",
                                path, min, len
                            ),
                        );
                    }
                }
            }
            Self::StringOneOf { values } => {
                if let Some(s) = value.as_str() {
                    if !values.iter().any(|v| v == s) {
                        let quoted: Vec<String> =
                            values.iter().map(|v| format!("\"{}\"", v)).collect();
                        diags.add_attribute_error(
                            path.clone(),
                            "Invalid Attribute Value Match",
                            format!(
                                "Attribute {} value must be one of: [{}], got: \"{}\"",
                                path,
                                quoted.join(" "),
                                s
                            ),
                        );
                    }
                }
            }
            Self::Duration | Self::NonZeroDuration => {
                if let Some(s) = value.as_str() {
                    match parse_duration(s) {
                        Err(e) => diags.add_attribute_error(
                            path.clone(),
                            "Invalid Attribute Value",
                            format!("Attribute {} is not a valid duration: {}", path, e),
                        ),
                        Ok(d) if d.is_zero() && *self == Self::NonZeroDuration => diags
                            .add_attribute_error(
                                path.clone(),
                                "Invalid Attribute Value",
                                format!("Attribute {} must be a duration greater than zero", path),
                            ),
                        Ok(_) => {}
                    }
                }
            }
            Self::Labels => {
                if let Some(map) = value.as_object() {
                    for (key, v) in map {
                        if let Err(reason) = validate_qualified_key(key) {
                            diags.add_attribute_error(
                                path.key(key),
                                "Invalid Label Key",
                                format!("Attribute {} key \"{}\" {}", path, key, reason),
                            );
                        }
                        if let Some(v) = v.as_str() {
                            if v.len() > MAX_NAME_LENGTH || !LABEL_VALUE.is_match(v) {
                                diags.add_attribute_error(
                                    path.key(key),
                                    "Invalid Label Value",
                                    format!(
                                        "Attribute {} value \"{}\" must be 63 characters or less, \
                                         begin and end with an alphanumeric character, and contain \
                                         only alphanumerics, '-', '_' or '.'",
                                        path.key(key),
                                        v
                                    ),
                                );
                            }
                        }
                    }
                }
            }
            Self::Annotations => {
                if let Some(map) = value.as_object() {
                    for key in map.keys() {
                        if let Err(reason) = validate_qualified_key(key) {
                            diags.add_attribute_error(
                                path.key(key),
                                "Invalid Annotation Key",
                                format!("Attribute {} key \"{}\" {}", path, key, reason),
                            );
                        }
                    }
                }
            }
        }
    }
}

/// Validate a label/annotation key of the form `[prefix/]name`
pub fn validate_qualified_key(key: &str) -> std::result::Result<(), String> {
    let (prefix, name) = match key.split_once('/') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, key),
    };

    if let Some(prefix) = prefix {
        if prefix.is_empty() {
            return Err("has an empty prefix".to_string());
        }
        if prefix.len() > MAX_PREFIX_LENGTH {
            return Err(format!(
                "has a prefix longer than {} characters",
                MAX_PREFIX_LENGTH
            ));
        }
        if !DNS_SUBDOMAIN.is_match(prefix) {
            return Err("has a prefix that is not a valid DNS subdomain".to_string());
        }
    }

    if name.is_empty() {
        return Err("has an empty name".to_string());
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(format!(
            "has a name longer than {} characters",
            MAX_NAME_LENGTH
        ));
    }
    if !QUALIFIED_NAME.is_match(name) {
        return Err(
            "must begin and end with an alphanumeric character and contain only alphanumerics, '-', '_' or '.'"
                .to_string(),
        );
    }
    Ok(())
}

/// Parse a duration string such as `30s`, `5m` or `1h30m`
pub fn parse_duration(input: &str) -> std::result::Result<std::time::Duration, String> {
    humantime_serde::re::humantime::parse_duration(input.trim()).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(validator: Validator, value: Value) -> Diagnostics {
        let mut diags = Diagnostics::new();
        let path = AttributePath::from_attributes(["metadata", "name"]);
        validator.validate(&path, &value, &mut diags);
        diags
    }

    #[test]
    fn test_string_length_at_least() {
        let diags = run(Validator::StringLengthAtLeast { min: 1 }, json!(""));
        assert!(diags.has_error());
        assert!(diags.contains("string length must be at least 1"));

        let diags = run(Validator::StringLengthAtLeast { min: 1 }, json!("ok"));
        assert!(diags.is_empty());
    }

    #[test]
    fn test_string_one_of() {
        let validator = Validator::StringOneOf {
            values: vec!["Orphan".into(), "Background".into(), "Foreground".into()],
        };
        assert!(run(validator.clone(), json!("Background")).is_empty());
        let diags = run(validator, json!("Never"));
        assert!(diags.contains("value must be one of"));
    }

    #[test]
    fn test_label_keys() {
        assert!(validate_qualified_key("app").is_ok());
        assert!(validate_qualified_key("app.kubernetes.io/name").is_ok());
        assert!(validate_qualified_key("example.com/").is_err());
        assert!(validate_qualified_key("/name").is_err());
        assert!(validate_qualified_key("-leading").is_err());
        assert!(validate_qualified_key("Example.com/name").is_err());
        assert!(validate_qualified_key(&"a".repeat(64)).is_err());
    }

    #[test]
    fn test_label_values() {
        let diags = run(Validator::Labels, json!({"app": "web", "tier": ""}));
        assert!(diags.is_empty());

        let diags = run(Validator::Labels, json!({"app": "-bad-"}));
        assert!(diags.contains("Invalid Label Value"));
    }

    #[test]
    fn test_annotations_allow_any_value() {
        let diags = run(
            Validator::Annotations,
            json!({"example.com/config": "{\"a\": 1}\n"}),
        );
        assert!(diags.is_empty());
    }

    #[test]
    fn test_non_zero_duration() {
        assert!(run(Validator::Duration, json!("0s")).is_empty());
        assert!(run(Validator::NonZeroDuration, json!("250ms")).is_empty());

        let diags = run(Validator::NonZeroDuration, json!("0s"));
        assert!(diags.contains("must be a duration greater than zero"));
        let diags = run(Validator::NonZeroDuration, json!("never"));
        assert!(diags.contains("is not a valid duration"));
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(
            parse_duration("30s").unwrap(),
            std::time::Duration::from_secs(30)
        );
        assert_eq!(
            parse_duration("1h30m").unwrap(),
            std::time::Duration::from_secs(5400)
        );
        assert_eq!(
            parse_duration("250ms").unwrap(),
            std::time::Duration::from_millis(250)
        );
        assert!(parse_duration("30").is_err());
        assert!(parse_duration("soon").is_err());
    }
}
