//! Structural checks on manifests
//!
//! Validation collects every issue it finds instead of stopping at the
//! first one, so a report can be shown to the user in full.

use base64::Engine as _;
use kubecraft_core::labels::{
    is_dns1123_label, is_dns1123_subdomain, validate_label_key, validate_label_value,
};
use kubecraft_core::{Mapping, Value};
use serde::Deserialize;
use std::fmt;

use crate::error::{KubeError, Result};

/// A single problem, located by a dotted path such as `spec.ports[0].port`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Result of validating one manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub kind: Option<String>,
    pub name: Option<String>,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// `kind/name` when both are known
    pub fn resource(&self) -> String {
        format!(
            "{}/{}",
            self.kind.as_deref().unwrap_or("<unknown>"),
            self.name.as_deref().unwrap_or("<unnamed>")
        )
    }

    pub fn into_result(self) -> Result<()> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(KubeError::Validation(self.issues))
        }
    }

    fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Parse a multi-document YAML stream into manifests
///
/// Empty documents (a stray `---`) are skipped.
pub fn parse_manifests(yaml: &str) -> Result<Vec<Value>> {
    let mut manifests = Vec::new();
    for document in serde_yaml::Deserializer::from_str(yaml) {
        let json = serde_json::Value::deserialize(document)?;
        if !json.is_null() {
            manifests.push(Value::from(json));
        }
    }
    Ok(manifests)
}

/// Validate a single manifest
pub fn validate_manifest(manifest: &Value) -> ValidationReport {
    let mut report = ValidationReport::default();

    let Some(root) = manifest.as_mapping() else {
        report.push("", "manifest must be a mapping");
        return report;
    };

    report.kind = root.get("kind").and_then(Value::as_str).map(str::to_string);
    report.name = manifest
        .pointer("metadata.name")
        .and_then(Value::as_str)
        .map(str::to_string);

    require_string(&mut report, root, "apiVersion", "apiVersion");
    require_string(&mut report, root, "kind", "kind");
    let cluster_scoped = report.kind.as_deref() == Some("Namespace");
    check_metadata(&mut report, root.get("metadata"), cluster_scoped);

    let spec = root.get("spec");
    match report.kind.clone().as_deref() {
        Some("Deployment") => check_deployment(&mut report, spec),
        Some("Service") => check_service(&mut report, spec),
        Some("HorizontalPodAutoscaler") => check_hpa(&mut report, spec),
        Some("Ingress") => check_ingress(&mut report, spec),
        Some("Secret") => check_secret(&mut report, root),
        Some("ConfigMap") => check_config_map(&mut report, root),
        _ => {}
    }

    tracing::debug!(
        resource = %report.resource(),
        issues = report.issues.len(),
        "validated manifest"
    );
    report
}

fn require_string<'a>(
    report: &mut ValidationReport,
    map: &'a Mapping,
    key: &str,
    path: &str,
) -> Option<&'a str> {
    match map.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.as_str()),
        Some(_) => {
            report.push(path, "must be a non-empty string");
            None
        }
        None => {
            report.push(path, "is required");
            None
        }
    }
}

fn require_mapping<'a>(
    report: &mut ValidationReport,
    value: Option<&'a Value>,
    path: &str,
) -> Option<&'a Mapping> {
    match value {
        Some(Value::Mapping(map)) => Some(map),
        Some(_) => {
            report.push(path, "must be a mapping");
            None
        }
        None => {
            report.push(path, "is required");
            None
        }
    }
}

fn require_sequence<'a>(
    report: &mut ValidationReport,
    value: Option<&'a Value>,
    path: &str,
) -> Option<&'a [Value]> {
    match value {
        Some(Value::Sequence(items)) if !items.is_empty() => Some(items),
        Some(Value::Sequence(_)) => {
            report.push(path, "must not be empty");
            None
        }
        Some(_) => {
            report.push(path, "must be a sequence");
            None
        }
        None => {
            report.push(path, "is required");
            None
        }
    }
}

fn check_metadata(report: &mut ValidationReport, metadata: Option<&Value>, cluster_scoped: bool) {
    let Some(meta) = require_mapping(report, metadata, "metadata") else {
        return;
    };

    if let Some(name) = require_string(report, meta, "name", "metadata.name") {
        if !is_dns1123_subdomain(name) {
            report.push("metadata.name", format!("'{}' is not a valid DNS subdomain", name));
        }
    }

    match meta.get("namespace") {
        Some(_) if cluster_scoped => {
            report.push("metadata.namespace", "cluster-scoped resources have no namespace")
        }
        Some(Value::String(ns)) if !is_dns1123_label(ns) => {
            report.push("metadata.namespace", format!("'{}' is not a valid DNS label", ns))
        }
        Some(Value::String(_)) | None => {}
        Some(_) => report.push("metadata.namespace", "must be a string"),
    }

    if let Some(labels) = meta.get("labels") {
        check_string_map(report, labels, "metadata.labels", true);
    }
    if let Some(annotations) = meta.get("annotations") {
        check_string_map(report, annotations, "metadata.annotations", false);
    }
}

/// Keys must be valid label keys; values must be strings (and valid label
/// values when `label_values` is set)
fn check_string_map(report: &mut ValidationReport, value: &Value, path: &str, label_values: bool) {
    let Some(map) = value.as_mapping() else {
        report.push(path, "must be a mapping");
        return;
    };

    for (key, value) in map.present() {
        let entry = format!("{}.{}", path, key);
        if let Err(e) = validate_label_key(key) {
            report.push(&entry, e.to_string());
        }
        match value {
            Value::String(s) if label_values => {
                if let Err(e) = validate_label_value(s) {
                    report.push(&entry, e.to_string());
                }
            }
            Value::String(_) => {}
            _ => report.push(&entry, "must be a string"),
        }
    }
}

fn check_port(report: &mut ValidationReport, value: Option<&Value>, path: &str, required: bool) {
    match value {
        None if required => report.push(path, "is required"),
        None => {}
        Some(Value::String(name)) if !required => {
            if !is_dns1123_label(name) {
                report.push(path, format!("'{}' is not a valid port name", name));
            }
        }
        Some(v) => match v.as_i64() {
            Some(port) if (1..=65535).contains(&port) => {}
            _ => report.push(path, "must be a port number between 1 and 65535"),
        },
    }
}

fn check_deployment(report: &mut ValidationReport, spec: Option<&Value>) {
    let Some(spec_map) = require_mapping(report, spec, "spec") else {
        return;
    };

    if let Some(replicas) = spec_map.get("replicas") {
        if !replicas.as_i64().is_some_and(|r| r >= 0) {
            report.push("spec.replicas", "must be a non-negative integer");
        }
    }

    let selector = spec_map
        .get("selector")
        .and_then(|s| s.get("matchLabels"))
        .and_then(Value::as_mapping);
    let pod_labels = spec_map
        .get("template")
        .and_then(|t| t.pointer("metadata.labels"))
        .and_then(Value::as_mapping);

    match selector {
        Some(selector) if selector.present_len() > 0 => {
            for (key, value) in selector.present() {
                if pod_labels.and_then(|labels| labels.get(key)) != Some(value) {
                    report.push(
                        "spec.template.metadata.labels",
                        format!("missing selector label '{}'", key),
                    );
                }
            }
        }
        _ => report.push("spec.selector.matchLabels", "must be a non-empty mapping"),
    }

    let containers = spec_map
        .get("template")
        .and_then(|t| t.pointer("spec.containers"));
    let Some(containers) = require_sequence(report, containers, "spec.template.spec.containers") else {
        return;
    };

    for (i, container) in containers.iter().enumerate() {
        let path = format!("spec.template.spec.containers[{}]", i);
        let Some(container) = require_mapping(report, Some(container), &path) else {
            continue;
        };
        require_string(report, container, "name", &format!("{}.name", path));
        require_string(report, container, "image", &format!("{}.image", path));

        if let Some(Value::Sequence(env)) = container.get("env") {
            for (j, var) in env.iter().enumerate() {
                if var.get("value").is_some_and(|v| v.as_str().is_none()) {
                    report.push(format!("{}.env[{}].value", path, j), "must be a string");
                }
            }
        }

        if let Some(Value::Sequence(ports)) = container.get("ports") {
            for (j, port) in ports.iter().enumerate() {
                check_port(
                    report,
                    port.get("containerPort"),
                    &format!("{}.ports[{}].containerPort", path, j),
                    true,
                );
            }
        }
    }
}

fn check_service(report: &mut ValidationReport, spec: Option<&Value>) {
    let Some(spec_map) = require_mapping(report, spec, "spec") else {
        return;
    };

    if let Some(service_type) = spec_map.get("type") {
        let known = ["ClusterIP", "NodePort", "LoadBalancer", "ExternalName"];
        if !service_type.as_str().is_some_and(|t| known.contains(&t)) {
            report.push("spec.type", "must be ClusterIP, NodePort, LoadBalancer or ExternalName");
        }
    }

    let Some(ports) = require_sequence(report, spec_map.get("ports"), "spec.ports") else {
        return;
    };

    for (i, port) in ports.iter().enumerate() {
        let path = format!("spec.ports[{}]", i);
        check_port(report, port.get("port"), &format!("{}.port", path), true);
        check_port(report, port.get("targetPort"), &format!("{}.targetPort", path), false);
        if let Some(node_port) = port.get("nodePort") {
            if !node_port.as_i64().is_some_and(|p| (30000..=32767).contains(&p)) {
                report.push(format!("{}.nodePort", path), "must be between 30000 and 32767");
            }
        }
    }
}

fn check_hpa(report: &mut ValidationReport, spec: Option<&Value>) {
    let Some(spec_map) = require_mapping(report, spec, "spec") else {
        return;
    };

    match spec_map.get("scaleTargetRef").and_then(Value::as_mapping) {
        Some(target) => {
            require_string(report, target, "kind", "spec.scaleTargetRef.kind");
            require_string(report, target, "name", "spec.scaleTargetRef.name");
        }
        None => report.push("spec.scaleTargetRef", "is required"),
    }

    let min = spec_map.get("minReplicas").map(|v| v.as_i64());
    let max = spec_map.get("maxReplicas").and_then(Value::as_i64);

    if let Some(min) = min {
        if !min.is_some_and(|m| m >= 1) {
            report.push("spec.minReplicas", "must be at least 1");
        }
    }
    match max {
        None => report.push("spec.maxReplicas", "must be an integer"),
        Some(max) => {
            let min = min.flatten().unwrap_or(1);
            if min > max {
                report.push(
                    "spec.maxReplicas",
                    format!("must not be less than minReplicas ({})", min),
                );
            }
        }
    }
}

fn check_ingress(report: &mut ValidationReport, spec: Option<&Value>) {
    let Some(spec_map) = require_mapping(report, spec, "spec") else {
        return;
    };
    let Some(rules) = require_sequence(report, spec_map.get("rules"), "spec.rules") else {
        return;
    };

    for (i, rule) in rules.iter().enumerate() {
        let path = format!("spec.rules[{}].http.paths", i);
        let Some(paths) = require_sequence(report, rule.pointer("http.paths"), &path) else {
            continue;
        };
        for (j, entry) in paths.iter().enumerate() {
            let backend = format!("{}[{}].backend.service", path, j);
            match entry.pointer("backend.service").and_then(Value::as_mapping) {
                Some(service) => {
                    require_string(report, service, "name", &format!("{}.name", backend));
                }
                None => report.push(backend, "is required"),
            }
        }
    }
}

fn check_secret(report: &mut ValidationReport, root: &Mapping) {
    if let Some(string_data) = root.get("stringData") {
        check_string_values(report, string_data, "stringData");
    }

    let Some(data) = root.get("data") else {
        return;
    };
    let Some(data) = data.as_mapping() else {
        report.push("data", "must be a mapping");
        return;
    };

    for (key, value) in data.present() {
        let path = format!("data.{}", key);
        match value.as_str() {
            Some(encoded) => {
                if base64::engine::general_purpose::STANDARD.decode(encoded).is_err() {
                    report.push(path, "is not valid base64");
                }
            }
            None => report.push(path, "must be a base64 string"),
        }
    }
}

fn check_config_map(report: &mut ValidationReport, root: &Mapping) {
    if let Some(data) = root.get("data") {
        check_string_values(report, data, "data");
    }
}

fn check_string_values(report: &mut ValidationReport, value: &Value, path: &str) {
    let Some(map) = value.as_mapping() else {
        report.push(path, "must be a mapping");
        return;
    };

    for (key, value) in map.present() {
        if value.as_str().is_none() {
            report.push(format!("{}.{}", path, key), "must be a string");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppSpec;
    use serde_json::json;

    fn validate(json: serde_json::Value) -> ValidationReport {
        validate_manifest(&Value::from(json))
    }

    fn paths(report: &ValidationReport) -> Vec<&str> {
        report.issues.iter().map(|i| i.path.as_str()).collect()
    }

    #[test]
    fn test_built_bundle_is_valid() {
        let mut spec = AppSpec::new("shop", "shop:1");
        spec.namespace = Some("apps".to_string());
        spec.create_namespace = true;
        spec.config.insert("MODE".to_string(), "prod".to_string());
        spec.secrets.insert("TOKEN".to_string(), "abc".to_string());

        for resource in spec.resources().unwrap() {
            let report = validate_manifest(&resource);
            assert!(report.is_valid(), "{}: {:?}", report.resource(), report.issues);
        }
    }

    #[test]
    fn test_not_a_mapping() {
        let report = validate(json!(["a"]));
        assert!(!report.is_valid());
        assert_eq!(report.issues[0].message, "manifest must be a mapping");
    }

    #[test]
    fn test_missing_header_fields() {
        let report = validate(json!({"metadata": {"name": "x"}}));
        assert_eq!(paths(&report), vec!["apiVersion", "kind"]);
        assert_eq!(report.resource(), "<unknown>/x");
    }

    #[test]
    fn test_invalid_name_and_labels() {
        let report = validate(json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {
                "name": "Bad_Name",
                "labels": {"app": "-bad-"},
                "annotations": {"note": 1}
            }
        }));
        assert_eq!(
            paths(&report),
            vec!["metadata.name", "metadata.labels.app", "metadata.annotations.note"]
        );
    }

    #[test]
    fn test_deployment_selector_mismatch() {
        let report = validate(json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {"name": "web"},
            "spec": {
                "replicas": -1,
                "selector": {"matchLabels": {"app": "web"}},
                "template": {
                    "metadata": {"labels": {"app": "other"}},
                    "spec": {"containers": [{"name": "web"}]}
                }
            }
        }));
        assert_eq!(
            paths(&report),
            vec![
                "spec.replicas",
                "spec.template.metadata.labels",
                "spec.template.spec.containers[0].image"
            ]
        );
    }

    #[test]
    fn test_service_ports() {
        let report = validate(json!({
            "apiVersion": "v1",
            "kind": "Service",
            "metadata": {"name": "web"},
            "spec": {
                "type": "Internal",
                "ports": [
                    {"port": 0},
                    {"port": 80, "targetPort": "http", "nodePort": 80},
                    {"port": 443, "targetPort": 70000}
                ]
            }
        }));
        assert_eq!(
            paths(&report),
            vec![
                "spec.type",
                "spec.ports[0].port",
                "spec.ports[1].nodePort",
                "spec.ports[2].targetPort"
            ]
        );
    }

    #[test]
    fn test_service_without_ports() {
        let report = validate(json!({
            "apiVersion": "v1",
            "kind": "Service",
            "metadata": {"name": "web"},
            "spec": {"ports": []}
        }));
        assert_eq!(report.issues[0].to_string(), "spec.ports: must not be empty");
    }

    #[test]
    fn test_hpa_bounds() {
        let report = validate(json!({
            "apiVersion": "autoscaling/v2",
            "kind": "HorizontalPodAutoscaler",
            "metadata": {"name": "web"},
            "spec": {
                "scaleTargetRef": {"kind": "Deployment", "name": "web"},
                "minReplicas": 5,
                "maxReplicas": 2
            }
        }));
        assert_eq!(paths(&report), vec!["spec.maxReplicas"]);
    }

    #[test]
    fn test_secret_base64() {
        let report = validate(json!({
            "apiVersion": "v1",
            "kind": "Secret",
            "metadata": {"name": "creds"},
            "data": {"good": "aHVudGVyMg==", "bad": "not base64!"}
        }));
        assert_eq!(paths(&report), vec!["data.bad"]);
    }

    #[test]
    fn test_string_data_values_must_be_strings() {
        let report = validate(json!({
            "apiVersion": "v1",
            "kind": "Secret",
            "metadata": {"name": "creds"},
            "stringData": {"user": "admin", "retries": -1}
        }));
        assert_eq!(paths(&report), vec!["stringData.retries"]);
    }

    #[test]
    fn test_env_values_must_be_strings() {
        let report = validate(json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {"name": "web"},
            "spec": {
                "selector": {"matchLabels": {"app": "web"}},
                "template": {
                    "metadata": {"labels": {"app": "web"}},
                    "spec": {"containers": [{
                        "name": "web",
                        "image": "nginx",
                        "env": [
                            {"name": "MODE", "value": "prod"},
                            {"name": "DEBUG", "value": true},
                            {"name": "POD", "valueFrom": {"fieldRef": {"fieldPath": "metadata.name"}}}
                        ]
                    }]}
                }
            }
        }));
        assert_eq!(paths(&report), vec!["spec.template.spec.containers[0].env[1].value"]);
    }

    #[test]
    fn test_unquoted_scalars_fail_after_reparse() {
        let mut spec = AppSpec::new("shop", "shop:1");
        spec.config.insert("RATIO".to_string(), "0.5".to_string());
        spec.config.insert("MODE".to_string(), "prod".to_string());

        let yaml = kubecraft_core::to_yaml_multi_doc(&spec.resources().unwrap());
        let reparsed = parse_manifests(&yaml).unwrap();
        let report = validate_manifest(&reparsed[0]);

        assert_eq!(report.kind.as_deref(), Some("ConfigMap"));
        assert_eq!(paths(&report), vec!["data.RATIO"]);
    }

    #[test]
    fn test_namespace_is_cluster_scoped() {
        let report = validate(json!({
            "apiVersion": "v1",
            "kind": "Namespace",
            "metadata": {"name": "apps", "namespace": "default"}
        }));
        assert_eq!(paths(&report), vec!["metadata.namespace"]);
    }

    #[test]
    fn test_ingress_backend_required() {
        let report = validate(json!({
            "apiVersion": "networking.k8s.io/v1",
            "kind": "Ingress",
            "metadata": {"name": "web"},
            "spec": {"rules": [{"http": {"paths": [{"path": "/"}]}}]}
        }));
        assert_eq!(paths(&report), vec!["spec.rules[0].http.paths[0].backend.service"]);
    }

    #[test]
    fn test_unknown_kind_only_checks_header() {
        let report = validate(json!({
            "apiVersion": "example.com/v1",
            "kind": "Widget",
            "metadata": {"name": "w"},
            "spec": {"anything": true}
        }));
        assert!(report.is_valid());
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn test_into_result_error() {
        let report = validate(json!({"kind": "Service"}));
        let err = report.into_result().unwrap_err();
        assert!(matches!(err, KubeError::Validation(ref issues) if issues.len() == 3));
    }

    #[test]
    fn test_parse_manifests() {
        let manifests = parse_manifests(
            "---\napiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: a\n---\napiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: b\n",
        )
        .unwrap();

        assert_eq!(manifests.len(), 2);
        assert_eq!(manifests[1].pointer("metadata.name").and_then(Value::as_str), Some("b"));
    }

    #[test]
    fn test_parse_manifests_invalid_yaml() {
        assert!(matches!(
            parse_manifests("a: [unclosed"),
            Err(KubeError::YamlParse(_))
        ));
    }
}
