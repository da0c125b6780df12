//! Manifest builders
//!
//! Each builder checks its spec, then produces an ordered `Value` tree with
//! `apiVersion`, `kind` and `metadata` first. Optional fields that are unset
//! are stored as absent entries so they never show up in the YAML output.

use base64::Engine as _;
use kubecraft_core::labels::{merge_labels, validate_labels};
use kubecraft_core::quantity::{parse_cpu, parse_memory};
use kubecraft_core::{Mapping, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{KubeError, Result};

// =============================================================================
// Shared pieces
// =============================================================================

/// Object metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

impl ObjectMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_labels(mut self, labels: BTreeMap<String, String>) -> Self {
        self.labels = merge_labels(&self.labels, &labels);
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    pub fn to_value(&self) -> Value {
        Mapping::new()
            .with("name", &self.name)
            .with_opt("namespace", self.namespace.as_deref())
            .with_opt("labels", non_empty(&self.labels))
            .with_opt("annotations", non_empty(&self.annotations))
            .into()
    }

    fn check(&self, kind: &'static str) -> Result<()> {
        if self.name.is_empty() {
            return Err(invalid(kind, "metadata.name must not be empty"));
        }
        validate_labels(&self.labels)?;
        Ok(())
    }
}

fn object(api_version: &str, kind: &str, meta: &ObjectMeta) -> Mapping {
    Mapping::new()
        .with("apiVersion", api_version)
        .with("kind", kind)
        .with("metadata", meta.to_value())
}

fn non_empty(map: &BTreeMap<String, String>) -> Option<Value> {
    (!map.is_empty()).then(|| Value::from(map))
}

fn invalid(kind: &'static str, message: impl Into<String>) -> KubeError {
    KubeError::InvalidSpec {
        kind,
        message: message.into(),
    }
}

/// A port given either by number or by name
///
/// Digit-only strings are emitted as numbers so `"8080"` and `8080` build
/// the same manifest.
fn port_value(port: &str) -> Value {
    match port.parse::<u16>() {
        Ok(n) => Value::from(n),
        Err(_) => Value::from(port),
    }
}

// =============================================================================
// Containers
// =============================================================================

/// Container environment variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

impl EnvVar {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Container port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPort {
    #[serde(default)]
    pub name: Option<String>,
    pub container_port: u16,
    #[serde(default)]
    pub protocol: Option<String>,
}

/// CPU and memory requests and limits
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequirements {
    #[serde(default)]
    pub requests: BTreeMap<String, String>,
    #[serde(default)]
    pub limits: BTreeMap<String, String>,
}

impl ResourceRequirements {
    fn check(&self) -> Result<()> {
        for quantities in [&self.requests, &self.limits] {
            if let Some(cpu) = quantities.get("cpu") {
                parse_cpu(cpu)?;
            }
            if let Some(memory) = quantities.get("memory") {
                parse_memory(memory)?;
            }
        }

        for resource in ["cpu", "memory"] {
            let request = self.requests.get(resource);
            let limit = self.limits.get(resource);
            if let (Some(request), Some(limit)) = (request, limit) {
                let parse: fn(&str) -> kubecraft_core::Result<u64> =
                    if resource == "cpu" { parse_cpu } else { parse_memory };
                if parse(request)? > parse(limit)? {
                    return Err(invalid(
                        "Deployment",
                        format!("{} request {} exceeds limit {}", resource, request, limit),
                    ));
                }
            }
        }
        Ok(())
    }

    fn to_value(&self) -> Value {
        Mapping::new()
            .with_opt("requests", non_empty(&self.requests))
            .with_opt("limits", non_empty(&self.limits))
            .into()
    }
}

/// HTTP or TCP probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Probe {
    /// HTTP path; a TCP socket probe is used when unset
    #[serde(default)]
    pub path: Option<String>,
    pub port: String,
    #[serde(default)]
    pub initial_delay_seconds: Option<u32>,
    #[serde(default)]
    pub period_seconds: Option<u32>,
}

impl Probe {
    pub fn http(path: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            port: port.into(),
            initial_delay_seconds: None,
            period_seconds: None,
        }
    }

    fn to_value(&self) -> Value {
        let mut probe = Mapping::new();
        match &self.path {
            Some(path) => probe.insert(
                "httpGet",
                Mapping::new()
                    .with("path", path)
                    .with("port", port_value(&self.port)),
            ),
            None => probe.insert(
                "tcpSocket",
                Mapping::new().with("port", port_value(&self.port)),
            ),
        }
        probe
            .with_opt("initialDelaySeconds", self.initial_delay_seconds)
            .with_opt("periodSeconds", self.period_seconds)
            .into()
    }
}

/// A pod container
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    #[serde(default)]
    pub image_pull_policy: Option<String>,
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub ports: Vec<ContainerPort>,
    #[serde(default)]
    pub env: Vec<EnvVar>,
    /// ConfigMap whose keys are loaded as environment variables
    #[serde(default)]
    pub env_from_config_map: Option<String>,
    /// Secret whose keys are loaded as environment variables
    #[serde(default)]
    pub env_from_secret: Option<String>,
    #[serde(default)]
    pub resources: Option<ResourceRequirements>,
    #[serde(default)]
    pub liveness_probe: Option<Probe>,
    #[serde(default)]
    pub readiness_probe: Option<Probe>,
}

impl ContainerSpec {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            ..Default::default()
        }
    }

    fn check(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(invalid("Deployment", "container name must not be empty"));
        }
        if self.image.is_empty() {
            return Err(invalid(
                "Deployment",
                format!("container '{}' has no image", self.name),
            ));
        }
        if let Some(resources) = &self.resources {
            resources.check()?;
        }
        Ok(())
    }

    fn to_value(&self) -> Value {
        let ports: Vec<Value> = self
            .ports
            .iter()
            .map(|p| {
                Mapping::new()
                    .with_opt("name", p.name.as_deref())
                    .with("containerPort", p.container_port)
                    .with_opt("protocol", p.protocol.as_deref())
                    .into()
            })
            .collect();

        let env: Vec<Value> = self
            .env
            .iter()
            .map(|e| Mapping::new().with("name", &e.name).with("value", &e.value).into())
            .collect();

        let mut env_from = Vec::new();
        if let Some(name) = &self.env_from_config_map {
            env_from.push(Value::from(
                Mapping::new().with("configMapRef", Mapping::new().with("name", name)),
            ));
        }
        if let Some(name) = &self.env_from_secret {
            env_from.push(Value::from(
                Mapping::new().with("secretRef", Mapping::new().with("name", name)),
            ));
        }

        Mapping::new()
            .with("name", &self.name)
            .with("image", &self.image)
            .with_opt("imagePullPolicy", self.image_pull_policy.as_deref())
            .with_opt("command", (!self.command.is_empty()).then(|| self.command.clone()))
            .with_opt("args", (!self.args.is_empty()).then(|| self.args.clone()))
            .with_opt("ports", (!ports.is_empty()).then_some(ports))
            .with_opt("env", (!env.is_empty()).then_some(env))
            .with_opt("envFrom", (!env_from.is_empty()).then_some(env_from))
            .with_opt("resources", self.resources.as_ref().map(ResourceRequirements::to_value))
            .with_opt("livenessProbe", self.liveness_probe.as_ref().map(Probe::to_value))
            .with_opt("readinessProbe", self.readiness_probe.as_ref().map(Probe::to_value))
            .into()
    }
}

// =============================================================================
// Deployment
// =============================================================================

fn default_replicas() -> u32 {
    1
}

/// apps/v1 Deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSpec {
    pub metadata: ObjectMeta,
    #[serde(default = "default_replicas")]
    pub replicas: u32,
    /// `spec.selector.matchLabels`; also applied to the pod template
    pub selector: BTreeMap<String, String>,
    /// Extra pod template labels
    #[serde(default)]
    pub pod_labels: BTreeMap<String, String>,
    #[serde(default)]
    pub pod_annotations: BTreeMap<String, String>,
    pub containers: Vec<ContainerSpec>,
}

impl DeploymentSpec {
    pub fn validate(&self) -> Result<()> {
        self.metadata.check("Deployment")?;
        if self.selector.is_empty() {
            return Err(invalid("Deployment", "selector must not be empty"));
        }
        validate_labels(&self.selector)?;
        validate_labels(&self.pod_labels)?;
        if self.containers.is_empty() {
            return Err(invalid("Deployment", "at least one container is required"));
        }
        for container in &self.containers {
            container.check()?;
        }
        Ok(())
    }
}

/// Build a Deployment
pub fn deployment(spec: &DeploymentSpec) -> Result<Value> {
    spec.validate()?;

    let pod_labels = merge_labels(&spec.pod_labels, &spec.selector);
    let containers: Vec<Value> = spec.containers.iter().map(ContainerSpec::to_value).collect();

    let template = Mapping::new()
        .with(
            "metadata",
            Mapping::new()
                .with("labels", &pod_labels)
                .with_opt("annotations", non_empty(&spec.pod_annotations)),
        )
        .with("spec", Mapping::new().with("containers", containers));

    let body = Mapping::new()
        .with("replicas", spec.replicas)
        .with(
            "selector",
            Mapping::new().with("matchLabels", &spec.selector),
        )
        .with("template", template);

    Ok(object("apps/v1", "Deployment", &spec.metadata)
        .with("spec", body)
        .into())
}

// =============================================================================
// Service
// =============================================================================

/// Service type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceType {
    #[default]
    ClusterIP,
    NodePort,
    LoadBalancer,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::ClusterIP => "ClusterIP",
            ServiceType::NodePort => "NodePort",
            ServiceType::LoadBalancer => "LoadBalancer",
        }
    }
}

/// Service port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePort {
    #[serde(default)]
    pub name: Option<String>,
    pub port: u16,
    /// Number or named container port
    #[serde(default)]
    pub target_port: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub node_port: Option<u16>,
}

impl ServicePort {
    pub fn new(port: u16) -> Self {
        Self {
            name: None,
            port,
            target_port: None,
            protocol: None,
            node_port: None,
        }
    }
}

/// v1 Service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    pub metadata: ObjectMeta,
    #[serde(default, rename = "type")]
    pub service_type: ServiceType,
    pub selector: BTreeMap<String, String>,
    pub ports: Vec<ServicePort>,
}

impl ServiceSpec {
    pub fn validate(&self) -> Result<()> {
        self.metadata.check("Service")?;
        if self.ports.is_empty() {
            return Err(invalid("Service", "at least one port is required"));
        }
        for port in &self.ports {
            if port.port == 0 {
                return Err(invalid("Service", "port must be between 1 and 65535"));
            }
            if port.node_port.is_some() && self.service_type == ServiceType::ClusterIP {
                return Err(invalid(
                    "Service",
                    "nodePort requires type NodePort or LoadBalancer",
                ));
            }
        }
        validate_labels(&self.selector)?;
        Ok(())
    }
}

/// Build a Service
pub fn service(spec: &ServiceSpec) -> Result<Value> {
    spec.validate()?;

    let ports: Vec<Value> = spec
        .ports
        .iter()
        .map(|p| {
            Mapping::new()
                .with_opt("name", p.name.as_deref())
                .with("port", p.port)
                .with_opt("targetPort", p.target_port.as_deref().map(port_value))
                .with_opt("protocol", p.protocol.as_deref())
                .with_opt("nodePort", p.node_port)
                .into()
        })
        .collect();

    let body = Mapping::new()
        .with("type", spec.service_type.as_str())
        .with("ports", ports)
        .with("selector", &spec.selector);

    Ok(object("v1", "Service", &spec.metadata)
        .with("spec", body)
        .into())
}

// =============================================================================
// ConfigMap & Secret
// =============================================================================

/// v1 ConfigMap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigMapSpec {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

/// Build a ConfigMap
pub fn config_map(spec: &ConfigMapSpec) -> Result<Value> {
    spec.metadata.check("ConfigMap")?;

    Ok(object("v1", "ConfigMap", &spec.metadata)
        .with("data", &spec.data)
        .into())
}

fn default_true() -> bool {
    true
}

/// v1 Secret
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretSpec {
    pub metadata: ObjectMeta,
    /// Secret type, `Opaque` when unset
    #[serde(default, rename = "type")]
    pub secret_type: Option<String>,
    /// Plain-text values
    #[serde(default)]
    pub string_data: BTreeMap<String, String>,
    /// Base64-encode values into `data`; otherwise emit them as `stringData`
    #[serde(default = "default_true")]
    pub encode: bool,
}

/// Build a Secret
pub fn secret(spec: &SecretSpec) -> Result<Value> {
    spec.metadata.check("Secret")?;

    let secret_type = spec.secret_type.as_deref().unwrap_or("Opaque");
    let mut manifest = object("v1", "Secret", &spec.metadata).with("type", secret_type);

    if spec.encode {
        let data: Mapping = spec
            .string_data
            .iter()
            .map(|(k, v)| {
                (
                    k.clone(),
                    base64::engine::general_purpose::STANDARD.encode(v.as_bytes()),
                )
            })
            .collect();
        manifest.insert("data", data);
    } else {
        manifest.insert("stringData", &spec.string_data);
    }

    Ok(manifest.into())
}

// =============================================================================
// Ingress
// =============================================================================

fn default_path() -> String {
    "/".to_string()
}

fn default_path_type() -> String {
    "Prefix".to_string()
}

/// A path routed to a Service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressPath {
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default = "default_path_type")]
    pub path_type: String,
    pub service_name: String,
    pub service_port: u16,
}

/// Host rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressRule {
    #[serde(default)]
    pub host: Option<String>,
    pub paths: Vec<IngressPath>,
}

/// TLS entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressTls {
    pub hosts: Vec<String>,
    pub secret_name: String,
}

/// networking.k8s.io/v1 Ingress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressSpec {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub ingress_class_name: Option<String>,
    #[serde(default)]
    pub tls: Vec<IngressTls>,
    pub rules: Vec<IngressRule>,
}

const PATH_TYPES: [&str; 3] = ["Prefix", "Exact", "ImplementationSpecific"];

impl IngressSpec {
    pub fn validate(&self) -> Result<()> {
        self.metadata.check("Ingress")?;
        if self.rules.is_empty() {
            return Err(invalid("Ingress", "at least one rule is required"));
        }
        for rule in &self.rules {
            if rule.paths.is_empty() {
                return Err(invalid("Ingress", "every rule needs at least one path"));
            }
            for path in &rule.paths {
                if !path.path.starts_with('/') {
                    return Err(invalid(
                        "Ingress",
                        format!("path '{}' must start with '/'", path.path),
                    ));
                }
                if !PATH_TYPES.contains(&path.path_type.as_str()) {
                    return Err(invalid(
                        "Ingress",
                        format!("unknown pathType '{}'", path.path_type),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Build an Ingress
pub fn ingress(spec: &IngressSpec) -> Result<Value> {
    spec.validate()?;

    let tls: Vec<Value> = spec
        .tls
        .iter()
        .map(|t| {
            Mapping::new()
                .with("hosts", t.hosts.clone())
                .with("secretName", &t.secret_name)
                .into()
        })
        .collect();

    let rules: Vec<Value> = spec
        .rules
        .iter()
        .map(|rule| {
            let paths: Vec<Value> = rule
                .paths
                .iter()
                .map(|p| {
                    let backend = Mapping::new().with(
                        "service",
                        Mapping::new()
                            .with("name", &p.service_name)
                            .with("port", Mapping::new().with("number", p.service_port)),
                    );
                    Mapping::new()
                        .with("path", &p.path)
                        .with("pathType", &p.path_type)
                        .with("backend", backend)
                        .into()
                })
                .collect();

            Mapping::new()
                .with_opt("host", rule.host.as_deref())
                .with("http", Mapping::new().with("paths", paths))
                .into()
        })
        .collect();

    let body = Mapping::new()
        .with_opt("ingressClassName", spec.ingress_class_name.as_deref())
        .with_opt("tls", (!tls.is_empty()).then_some(tls))
        .with("rules", rules);

    Ok(object("networking.k8s.io/v1", "Ingress", &spec.metadata)
        .with("spec", body)
        .into())
}

// =============================================================================
// Namespace
// =============================================================================

/// v1 Namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceSpec {
    pub metadata: ObjectMeta,
}

/// Build a Namespace
pub fn namespace(spec: &NamespaceSpec) -> Result<Value> {
    spec.metadata.check("Namespace")?;
    if spec.metadata.namespace.is_some() {
        return Err(invalid("Namespace", "a Namespace is cluster-scoped"));
    }

    Ok(object("v1", "Namespace", &spec.metadata).into())
}

// =============================================================================
// HorizontalPodAutoscaler
// =============================================================================

fn default_target_kind() -> String {
    "Deployment".to_string()
}

fn default_target_api_version() -> String {
    "apps/v1".to_string()
}

/// autoscaling/v2 HorizontalPodAutoscaler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HpaSpec {
    pub metadata: ObjectMeta,
    pub target_name: String,
    #[serde(default = "default_target_kind")]
    pub target_kind: String,
    #[serde(default = "default_target_api_version")]
    pub target_api_version: String,
    #[serde(default = "default_replicas")]
    pub min_replicas: u32,
    pub max_replicas: u32,
    /// Average CPU utilization target, in percent
    #[serde(default)]
    pub target_cpu_utilization: Option<u32>,
    /// Average memory utilization target, in percent
    #[serde(default)]
    pub target_memory_utilization: Option<u32>,
}

impl HpaSpec {
    pub fn validate(&self) -> Result<()> {
        self.metadata.check("HorizontalPodAutoscaler")?;
        if self.min_replicas == 0 {
            return Err(invalid("HorizontalPodAutoscaler", "minReplicas must be at least 1"));
        }
        if self.min_replicas > self.max_replicas {
            return Err(invalid(
                "HorizontalPodAutoscaler",
                format!(
                    "minReplicas ({}) must not exceed maxReplicas ({})",
                    self.min_replicas, self.max_replicas
                ),
            ));
        }
        for target in [self.target_cpu_utilization, self.target_memory_utilization]
            .into_iter()
            .flatten()
        {
            if target == 0 || target > 100 {
                return Err(invalid(
                    "HorizontalPodAutoscaler",
                    "utilization targets must be between 1 and 100",
                ));
            }
        }
        Ok(())
    }
}

fn resource_metric(resource: &str, utilization: u32) -> Value {
    Mapping::new()
        .with("type", "Resource")
        .with(
            "resource",
            Mapping::new().with("name", resource).with(
                "target",
                Mapping::new()
                    .with("type", "Utilization")
                    .with("averageUtilization", utilization),
            ),
        )
        .into()
}

/// Build a HorizontalPodAutoscaler
pub fn hpa(spec: &HpaSpec) -> Result<Value> {
    spec.validate()?;

    let mut metrics = Vec::new();
    if let Some(cpu) = spec.target_cpu_utilization {
        metrics.push(resource_metric("cpu", cpu));
    }
    if let Some(memory) = spec.target_memory_utilization {
        metrics.push(resource_metric("memory", memory));
    }

    let body = Mapping::new()
        .with(
            "scaleTargetRef",
            Mapping::new()
                .with("apiVersion", &spec.target_api_version)
                .with("kind", &spec.target_kind)
                .with("name", &spec.target_name),
        )
        .with("minReplicas", spec.min_replicas)
        .with("maxReplicas", spec.max_replicas)
        .with_opt("metrics", (!metrics.is_empty()).then_some(metrics));

    Ok(object("autoscaling/v2", "HorizontalPodAutoscaler", &spec.metadata)
        .with("spec", body)
        .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kubecraft_core::to_yaml_string;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn web_deployment() -> DeploymentSpec {
        let mut container = ContainerSpec::new("web", "nginx:1.25");
        container.ports.push(ContainerPort {
            name: Some("http".to_string()),
            container_port: 80,
            protocol: None,
        });

        DeploymentSpec {
            metadata: ObjectMeta::new("web").with_namespace("apps"),
            replicas: 2,
            selector: labels(&[("app", "web")]),
            pod_labels: BTreeMap::new(),
            pod_annotations: BTreeMap::new(),
            containers: vec![container],
        }
    }

    #[test]
    fn test_deployment_yaml() {
        let value = deployment(&web_deployment()).unwrap();

        insta::assert_snapshot!(to_yaml_string(&value), @r#"
        apiVersion: apps/v1
        kind: Deployment
        metadata:
          name: web
          namespace: apps
        spec:
          replicas: 2
          selector:
            matchLabels:
              app: web
          template:
            metadata:
              labels:
                app: web
            spec:
              containers:
                - name: web
                  image: "nginx:1.25"
                  ports:
                    - name: http
                      containerPort: 80
        "#);
    }

    #[test]
    fn test_deployment_requires_containers() {
        let mut spec = web_deployment();
        spec.containers.clear();
        assert!(matches!(
            deployment(&spec),
            Err(KubeError::InvalidSpec { kind: "Deployment", .. })
        ));
    }

    #[test]
    fn test_deployment_requires_selector() {
        let mut spec = web_deployment();
        spec.selector.clear();
        assert!(deployment(&spec).is_err());
    }

    #[test]
    fn test_deployment_pod_labels_merge_selector() {
        let mut spec = web_deployment();
        spec.pod_labels = labels(&[("tier", "frontend"), ("app", "other")]);
        let value = deployment(&spec).unwrap();

        let pod_labels = value.pointer("spec.template.metadata.labels").unwrap();
        assert_eq!(pod_labels.get("app").and_then(Value::as_str), Some("web"));
        assert_eq!(pod_labels.get("tier").and_then(Value::as_str), Some("frontend"));
    }

    #[test]
    fn test_container_details() {
        let mut spec = web_deployment();
        let container = &mut spec.containers[0];
        container.env.push(EnvVar::new("LOG_LEVEL", "info"));
        container.env_from_config_map = Some("web-config".to_string());
        container.resources = Some(ResourceRequirements {
            requests: labels(&[("cpu", "100m"), ("memory", "128Mi")]),
            limits: labels(&[("cpu", "500m"), ("memory", "256Mi")]),
        });
        container.readiness_probe = Some(Probe::http("/healthz", "http"));

        let value = deployment(&spec).unwrap();
        let c = value.pointer("spec.template.spec.containers.0").unwrap();

        assert_eq!(c.pointer("env.0.name").and_then(Value::as_str), Some("LOG_LEVEL"));
        assert_eq!(
            c.pointer("envFrom.0.configMapRef.name").and_then(Value::as_str),
            Some("web-config")
        );
        assert_eq!(
            c.pointer("resources.limits.memory").and_then(Value::as_str),
            Some("256Mi")
        );
        assert_eq!(
            c.pointer("readinessProbe.httpGet.port").and_then(Value::as_str),
            Some("http")
        );
        assert!(c.get("livenessProbe").is_none());
    }

    #[test]
    fn test_resources_rejects_bad_quantity() {
        let mut spec = web_deployment();
        spec.containers[0].resources = Some(ResourceRequirements {
            requests: labels(&[("cpu", "lots")]),
            limits: BTreeMap::new(),
        });
        assert!(matches!(deployment(&spec), Err(KubeError::Core(_))));
    }

    #[test]
    fn test_resources_request_above_limit() {
        let mut spec = web_deployment();
        spec.containers[0].resources = Some(ResourceRequirements {
            requests: labels(&[("memory", "1Gi")]),
            limits: labels(&[("memory", "512Mi")]),
        });
        let err = deployment(&spec).unwrap_err();
        assert!(err.to_string().contains("exceeds limit"));
    }

    #[test]
    fn test_tcp_probe() {
        let probe = Probe {
            path: None,
            port: "5432".to_string(),
            initial_delay_seconds: Some(5),
            period_seconds: None,
        };
        assert_eq!(
            to_yaml_string(&probe.to_value()),
            "tcpSocket:\n  port: 5432\ninitialDelaySeconds: 5"
        );
    }

    #[test]
    fn test_service_yaml() {
        let mut port = ServicePort::new(80);
        port.target_port = Some("8080".to_string());
        let spec = ServiceSpec {
            metadata: ObjectMeta::new("web"),
            service_type: ServiceType::ClusterIP,
            selector: labels(&[("app", "web")]),
            ports: vec![port],
        };

        assert_eq!(
            to_yaml_string(&service(&spec).unwrap()),
            "apiVersion: v1\nkind: Service\nmetadata:\n  name: web\nspec:\n  type: ClusterIP\n  ports:\n    - port: 80\n      targetPort: 8080\n  selector:\n    app: web"
        );
    }

    #[test]
    fn test_service_node_port_requires_type() {
        let mut port = ServicePort::new(80);
        port.node_port = Some(30080);
        let mut spec = ServiceSpec {
            metadata: ObjectMeta::new("web"),
            service_type: ServiceType::ClusterIP,
            selector: labels(&[("app", "web")]),
            ports: vec![port],
        };
        assert!(service(&spec).is_err());

        spec.service_type = ServiceType::NodePort;
        let value = service(&spec).unwrap();
        assert_eq!(value.pointer("spec.ports.0.nodePort").and_then(Value::as_i64), Some(30080));
    }

    #[test]
    fn test_config_map() {
        let spec = ConfigMapSpec {
            metadata: ObjectMeta::new("settings"),
            data: labels(&[("PORT", "8080"), ("MODE", "production")]),
        };
        assert_eq!(
            to_yaml_string(&config_map(&spec).unwrap()),
            "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: settings\ndata:\n  MODE: production\n  PORT: \"8080\""
        );
    }

    #[test]
    fn test_empty_config_map_data() {
        let spec = ConfigMapSpec {
            metadata: ObjectMeta::new("empty"),
            data: BTreeMap::new(),
        };
        assert!(to_yaml_string(&config_map(&spec).unwrap()).ends_with("data: {}"));
    }

    #[test]
    fn test_secret_encoded() {
        let spec = SecretSpec {
            metadata: ObjectMeta::new("creds"),
            secret_type: None,
            string_data: labels(&[("password", "hunter2")]),
            encode: true,
        };
        let value = secret(&spec).unwrap();

        assert_eq!(value.get("type").and_then(Value::as_str), Some("Opaque"));
        assert_eq!(
            value.pointer("data.password").and_then(Value::as_str),
            Some("aHVudGVyMg==")
        );
        assert!(value.get("stringData").is_none());
    }

    #[test]
    fn test_secret_string_data() {
        let spec = SecretSpec {
            metadata: ObjectMeta::new("tls"),
            secret_type: Some("kubernetes.io/tls".to_string()),
            string_data: labels(&[("tls.crt", "CERT")]),
            encode: false,
        };
        let value = secret(&spec).unwrap();

        assert_eq!(value.get("type").and_then(Value::as_str), Some("kubernetes.io/tls"));
        assert_eq!(
            value.pointer("stringData").and_then(|v| v.get("tls.crt")).and_then(Value::as_str),
            Some("CERT")
        );
    }

    #[test]
    fn test_ingress_yaml() {
        let spec = IngressSpec {
            metadata: ObjectMeta::new("web"),
            ingress_class_name: Some("nginx".to_string()),
            tls: vec![IngressTls {
                hosts: vec!["web.example.com".to_string()],
                secret_name: "web-tls".to_string(),
            }],
            rules: vec![IngressRule {
                host: Some("web.example.com".to_string()),
                paths: vec![IngressPath {
                    path: "/".to_string(),
                    path_type: "Prefix".to_string(),
                    service_name: "web".to_string(),
                    service_port: 80,
                }],
            }],
        };

        insta::assert_snapshot!(to_yaml_string(&ingress(&spec).unwrap()), @r"
        apiVersion: networking.k8s.io/v1
        kind: Ingress
        metadata:
          name: web
        spec:
          ingressClassName: nginx
          tls:
            - hosts:
                - web.example.com
              secretName: web-tls
          rules:
            - host: web.example.com
              http:
                paths:
                  - path: /
                    pathType: Prefix
                    backend:
                      service:
                        name: web
                        port:
                          number: 80
        ");
    }

    #[test]
    fn test_ingress_rejects_relative_path() {
        let spec = IngressSpec {
            metadata: ObjectMeta::new("web"),
            ingress_class_name: None,
            tls: vec![],
            rules: vec![IngressRule {
                host: None,
                paths: vec![IngressPath {
                    path: "api".to_string(),
                    path_type: "Prefix".to_string(),
                    service_name: "web".to_string(),
                    service_port: 80,
                }],
            }],
        };
        assert!(ingress(&spec).is_err());
    }

    #[test]
    fn test_namespace() {
        let spec = NamespaceSpec {
            metadata: ObjectMeta::new("apps").with_labels(labels(&[("team", "core")])),
        };
        assert_eq!(
            to_yaml_string(&namespace(&spec).unwrap()),
            "apiVersion: v1\nkind: Namespace\nmetadata:\n  name: apps\n  labels:\n    team: core"
        );

        let scoped = NamespaceSpec {
            metadata: ObjectMeta::new("apps").with_namespace("default"),
        };
        assert!(namespace(&scoped).is_err());
    }

    #[test]
    fn test_hpa() {
        let spec = HpaSpec {
            metadata: ObjectMeta::new("web"),
            target_name: "web".to_string(),
            target_kind: default_target_kind(),
            target_api_version: default_target_api_version(),
            min_replicas: 2,
            max_replicas: 10,
            target_cpu_utilization: Some(75),
            target_memory_utilization: None,
        };
        let value = hpa(&spec).unwrap();

        assert_eq!(value.get("apiVersion").and_then(Value::as_str), Some("autoscaling/v2"));
        assert_eq!(value.pointer("spec.scaleTargetRef.kind").and_then(Value::as_str), Some("Deployment"));
        assert_eq!(value.pointer("spec.minReplicas").and_then(Value::as_i64), Some(2));
        assert_eq!(
            value.pointer("spec.metrics.0.resource.target.averageUtilization").and_then(Value::as_i64),
            Some(75)
        );
        assert!(value.pointer("spec.metrics.1").is_none());
    }

    #[test]
    fn test_hpa_bounds() {
        let mut spec = HpaSpec {
            metadata: ObjectMeta::new("web"),
            target_name: "web".to_string(),
            target_kind: default_target_kind(),
            target_api_version: default_target_api_version(),
            min_replicas: 5,
            max_replicas: 2,
            target_cpu_utilization: None,
            target_memory_utilization: None,
        };
        assert!(hpa(&spec).is_err());

        spec.max_replicas = 5;
        spec.target_memory_utilization = Some(150);
        assert!(hpa(&spec).is_err());
    }

    #[test]
    fn test_spec_from_yaml() {
        let spec: ServiceSpec = serde_yaml::from_str(
            r#"
metadata:
  name: api
type: LoadBalancer
selector:
  app: api
ports:
  - port: 443
    targetPort: https
"#,
        )
        .unwrap();

        assert_eq!(spec.service_type, ServiceType::LoadBalancer);
        let value = service(&spec).unwrap();
        assert_eq!(
            value.pointer("spec.ports.0.targetPort").and_then(Value::as_str),
            Some("https")
        );
    }
}
