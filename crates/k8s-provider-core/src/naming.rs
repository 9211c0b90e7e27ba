//! Naming conventions: Terraform attribute names and type names

/// Convert a Kubernetes field name to a Terraform attribute name
///
/// - `apiVersion` → `api_version`
/// - `podCIDR` → `pod_cidr`
/// - `IPAddresses` → `ip_addresses`
/// - `x-kubernetes-foo` → `x_kubernetes_foo`
/// - `$ref` → `ref`
/// - `2xx` → `_2xx`
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_alphanumeric() {
            if c.is_ascii_uppercase() && i > 0 {
                let prev = chars[i - 1];
                let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
                let boundary = prev.is_ascii_lowercase()
                    || prev.is_ascii_digit()
                    || (prev.is_ascii_uppercase() && next_is_lower);
                if boundary && !out.ends_with('_') {
                    out.push('_');
                }
            }
            out.push(c.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    }

    while out.ends_with('_') {
        out.pop();
    }
    if out.is_empty() {
        return "_".to_string();
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Terraform type name for a CRD kind and version
///
/// `cert-manager.io` / `ClusterIssuer` / `v1` → `k8s_cert_manager_io_cluster_issuer_v1`
pub fn type_name(group: &str, kind: &str, version: &str) -> String {
    let group = group.replace(['.', '-'], "_").to_ascii_lowercase();
    let kind = to_snake_case(kind);
    let version = version.to_ascii_lowercase();
    if group.is_empty() {
        format!("k8s_{}_{}", kind, version)
    } else {
        format!("k8s_{}_{}_{}", group, kind, version)
    }
}

/// Type name of the manifest variant
pub fn manifest_type_name(group: &str, kind: &str, version: &str) -> String {
    format!("{}_manifest", type_name(group, kind, version))
}
